use serde::{Deserialize, Serialize};
use std::fmt;

/// The four fixed telemetry streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Vehicle,
    Gps,
    Traffic,
    Weather,
}

impl Topic {
    /// Publication order within one tick.
    pub const ALL: [Topic; 4] = [Topic::Vehicle, Topic::Gps, Topic::Traffic, Topic::Weather];

    /// Default broker topic name.
    pub fn default_name(&self) -> &'static str {
        match self {
            Topic::Vehicle => "vehicle_data",
            Topic::Gps => "gps_data",
            Topic::Traffic => "traffic_data",
            Topic::Weather => "weather_data",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_name())
    }
}

/// Broker topic names, one per stream, with per-stream overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicNames {
    pub vehicle: String,
    pub gps: String,
    pub traffic: String,
    pub weather: String,
}

impl TopicNames {
    pub fn name(&self, topic: Topic) -> &str {
        match topic {
            Topic::Vehicle => &self.vehicle,
            Topic::Gps => &self.gps,
            Topic::Traffic => &self.traffic,
            Topic::Weather => &self.weather,
        }
    }

    pub fn with(mut self, topic: Topic, name: impl Into<String>) -> Self {
        let name = name.into();
        match topic {
            Topic::Vehicle => self.vehicle = name,
            Topic::Gps => self.gps = name,
            Topic::Traffic => self.traffic = name,
            Topic::Weather => self.weather = name,
        }

        self
    }
}

impl Default for TopicNames {
    fn default() -> Self {
        Self {
            vehicle: Topic::Vehicle.default_name().to_owned(),
            gps: Topic::Gps.default_name().to_owned(),
            traffic: Topic::Traffic.default_name().to_owned(),
            weather: Topic::Weather.default_name().to_owned(),
        }
    }
}
