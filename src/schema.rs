use chrono;

use crate::model::Classification;
use crate::status;

/// What the dashboard currently shows. Serialized as-is in `--json` mode.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub readings: Vec<Classification>,
    pub water_needed: bool,
    pub last_update: chrono::DateTime<chrono::Utc>,
    /// Set until the first poll that returns at least one reading.
    pub loading: bool,
}

impl Dashboard {
    pub fn new(now: chrono::DateTime<chrono::Utc>) -> Self {
        Dashboard {
            readings: Vec::new(),
            water_needed: false,
            last_update: now,
            loading: true,
        }
    }

    /// Replaces the shown readings with the result of a successful poll.
    pub fn update(&mut self, readings: Vec<Classification>, now: chrono::DateTime<chrono::Utc>) {
        self.water_needed = status::decide_watering(&readings);
        self.readings = readings;
        self.last_update = now;
        if !self.readings.is_empty() {
            self.loading = false;
        }
    }
}
