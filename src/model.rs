use std::fmt;
use std::str;

use failure::Fail;

/// One of the monitored physical quantities.
///
/// The serialized form is the key the realtime database stores the record
/// under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Factor {
    Temperature,
    WaterLevel,
    SoilMoisture,
}

/// Three-way classification of a reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Low,
    Normal,
    High,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    pub factor: Factor,
    pub value: f64,
}

/// A reading together with its status, as shown on one sensor card.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub factor: Factor,
    pub status: Status,
    pub value: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Fail)]
#[fail(display = "unrecognized factor {:?}", name)]
pub struct UnknownFactor {
    pub name: String,
}

impl Factor {
    pub const ALL: [Factor; 3] = [Factor::Temperature, Factor::WaterLevel, Factor::SoilMoisture];

    /// Database key of this factor.
    pub fn name(self) -> &'static str {
        match self {
            Factor::Temperature => "temperature",
            Factor::WaterLevel => "water-level",
            Factor::SoilMoisture => "soil-moisture",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Factor::Temperature => "Temperature",
            Factor::WaterLevel => "Water Level",
            Factor::SoilMoisture => "Soil Moisture",
        }
    }

    /// Card heading, including the unit readings are reported in.
    pub fn label(self) -> &'static str {
        match self {
            Factor::Temperature => "Temperature (°C)",
            Factor::WaterLevel => "Water Level (%)",
            Factor::SoilMoisture => "Soil Moisture (centibars)",
        }
    }

    /// Suffix appended to threshold values in the reference table.
    pub fn unit(self) -> &'static str {
        match self {
            Factor::Temperature => "°C",
            Factor::WaterLevel => "%",
            Factor::SoilMoisture => "",
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl str::FromStr for Factor {
    type Err = UnknownFactor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Factor::ALL
            .iter()
            .cloned()
            .find(|factor| factor.name() == s)
            .ok_or_else(|| UnknownFactor { name: s.to_owned() })
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            Status::Low => "Low",
            Status::Normal => "Normal",
            Status::High => "High",
        })
    }
}

impl Reading {
    pub fn new(factor: Factor, value: f64) -> Self {
        Reading { factor, value }
    }
}
