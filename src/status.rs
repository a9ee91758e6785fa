//! Status classification and the watering decision.
//!
//! Everything here is a pure function of its arguments. Readings that are
//! missing or failed to load never reach this module.

use crate::model::{Classification, Factor, Reading, Status};

/// Cutoffs for one factor. Values strictly below `low` are Low, strictly
/// above `high` are High, and everything in between (bounds included) is
/// Normal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
    pub low: f64,
    pub high: f64,
}

pub const TEMPERATURE: Thresholds = Thresholds::new(15.0, 35.0);
pub const WATER_LEVEL: Thresholds = Thresholds::new(30.0, 80.0);
/// Higher readings mean drier soil.
pub const SOIL_MOISTURE: Thresholds = Thresholds::new(10.0, 60.0);

/// One row of the status reference table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReferenceRow {
    pub factor: Factor,
    pub low: String,
    pub normal: String,
    pub high: String,
}

impl Thresholds {
    pub const fn new(low: f64, high: f64) -> Self {
        Thresholds { low, high }
    }

    /// NaN compares false against both cutoffs and therefore lands on Normal.
    pub fn status(&self, value: f64) -> Status {
        if value < self.low {
            Status::Low
        } else if value > self.high {
            Status::High
        } else {
            Status::Normal
        }
    }
}

pub fn thresholds(factor: Factor) -> Thresholds {
    match factor {
        Factor::Temperature => TEMPERATURE,
        Factor::WaterLevel => WATER_LEVEL,
        Factor::SoilMoisture => SOIL_MOISTURE,
    }
}

pub fn classify(factor: Factor, value: f64) -> Status {
    thresholds(factor).status(value)
}

/// Classifies by database key. Keys that don't name a known factor fall back
/// to Normal.
pub fn classify_named(name: &str, value: f64) -> Status {
    name.parse::<Factor>()
        .map(|factor| classify(factor, value))
        .unwrap_or(Status::Normal)
}

pub fn evaluate(reading: Reading, min: Option<f64>, max: Option<f64>) -> Classification {
    Classification {
        factor: reading.factor,
        status: classify(reading.factor, reading.value),
        value: reading.value,
        min,
        max,
    }
}

/// Whether a single factor's status calls for watering on its own.
pub fn triggers_watering(factor: Factor, status: Status) -> bool {
    match (factor, status) {
        (Factor::WaterLevel, Status::Low)
        | (Factor::SoilMoisture, Status::Low)
        | (Factor::Temperature, Status::High) => true,
        _ => false,
    }
}

/// True as soon as any classification triggers watering.
pub fn decide_watering<'a, I>(classifications: I) -> bool
where
    I: IntoIterator<Item = &'a Classification>,
{
    classifications
        .into_iter()
        .any(|c| triggers_watering(c.factor, c.status))
}

/// The status reference table, built from the same cutoffs `classify` uses.
pub fn reference() -> Vec<ReferenceRow> {
    Factor::ALL
        .iter()
        .map(|&factor| {
            let Thresholds { low, high } = thresholds(factor);
            let unit = factor.unit();
            ReferenceRow {
                factor,
                low: format!("< {}{}", low, unit),
                normal: format!("{}{} - {}{}", low, unit, high, unit),
                high: format!("> {}{}", high, unit),
            }
        })
        .collect()
}
