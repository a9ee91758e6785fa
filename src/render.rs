//! Terminal output for the dashboard and the status reference table.

use std::io;

use chrono;
use failure;
use serde_json;

use crate::model::Factor;
use crate::schema;
use crate::status;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn banner(water_needed: bool) -> &'static str {
    if water_needed {
        "Time to Water!"
    } else {
        "No Watering Needed"
    }
}

/// Writes the watering banner, one line per sensor card and the clock line.
pub fn dashboard<W, Tz>(
    out: &mut W,
    dashboard: &schema::Dashboard,
    now: chrono::DateTime<Tz>,
) -> io::Result<()>
where
    W: io::Write,
    Tz: chrono::TimeZone,
    Tz::Offset: std::fmt::Display,
{
    writeln!(out, "{}", banner(dashboard.water_needed))?;

    if dashboard.loading {
        for factor in &Factor::ALL {
            writeln!(out, "  {:<27} ...", format!("{}:", factor.title()))?;
        }
    } else {
        for reading in &dashboard.readings {
            writeln!(
                out,
                "  {:<27} {:>8} {}",
                format!("{}:", reading.factor.label()),
                reading.value,
                reading.status
            )?;
        }
    }

    let last_update = dashboard.last_update.with_timezone(&now.timezone());
    writeln!(
        out,
        "Current Time: {}  Last Updated: {}",
        now.format(TIME_FORMAT),
        last_update.format(TIME_FORMAT)
    )?;

    Ok(())
}

/// Writes the dashboard as a single JSON line.
pub fn json<W>(out: &mut W, dashboard: &schema::Dashboard) -> Result<(), failure::Error>
where
    W: io::Write,
{
    serde_json::to_writer(&mut *out, dashboard)?;
    writeln!(out)?;
    Ok(())
}

pub fn reference<W>(out: &mut W, rows: &[status::ReferenceRow]) -> io::Result<()>
where
    W: io::Write,
{
    writeln!(out, "{:<15} {:<9} {:<15} {}", "Variable", "Low", "Normal", "High")?;
    for row in rows {
        writeln!(
            out,
            "{:<15} {:<9} {:<15} {}",
            row.factor.title(),
            row.low,
            row.normal,
            row.high
        )?;
    }
    Ok(())
}
