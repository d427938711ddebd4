use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::Result, Position, Topic};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleEvent {
    pub id: Uuid,
    #[serde(rename = "deviceID")]
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    pub location: Position,
    pub speed: f64,
    pub direction: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    #[serde(rename = "fuelType")]
    pub fuel_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsEvent {
    pub id: Uuid,
    #[serde(rename = "deviceID")]
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    pub speed: f64,
    pub direction: String,
    pub vehicle_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficEvent {
    pub id: Uuid,
    #[serde(rename = "deviceID")]
    pub device_id: String,
    #[serde(rename = "cameraID")]
    pub camera_id: String,
    pub location: Position,
    pub timestamp: DateTime<Utc>,
    /// Opaque reference to the camera frame.
    pub snapshot: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherCondition {
    Sunny,
    Cloudy,
    Rain,
}

impl WeatherCondition {
    pub const ALL: [WeatherCondition; 3] = [Self::Sunny, Self::Cloudy, Self::Rain];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sunny => "sunny",
            Self::Cloudy => "cloudy",
            Self::Rain => "rain",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherEvent {
    pub id: Uuid,
    #[serde(rename = "deviceID")]
    pub device_id: String,
    pub location: Position,
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    #[serde(rename = "weatherCondition")]
    pub weather_condition: WeatherCondition,
    pub precipitation: f64,
    pub windspeed: f64,
    pub humidity: i32,
    #[serde(rename = "airQualityIndex")]
    pub air_quality_index: f64,
}

/// Closed union of everything the producer publishes.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryEvent {
    Vehicle(VehicleEvent),
    Gps(GpsEvent),
    Traffic(TrafficEvent),
    Weather(WeatherEvent),
}

impl TelemetryEvent {
    pub fn topic(&self) -> Topic {
        match self {
            Self::Vehicle(_) => Topic::Vehicle,
            Self::Gps(_) => Topic::Gps,
            Self::Traffic(_) => Topic::Traffic,
            Self::Weather(_) => Topic::Weather,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::Vehicle(e) => e.id,
            Self::Gps(e) => e.id,
            Self::Traffic(e) => e.id,
            Self::Weather(e) => e.id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Vehicle(e) => e.timestamp,
            Self::Gps(e) => e.timestamp,
            Self::Traffic(e) => e.timestamp,
            Self::Weather(e) => e.timestamp,
        }
    }

    pub fn location(&self) -> Option<Position> {
        match self {
            Self::Vehicle(e) => Some(e.location),
            Self::Gps(_) => None,
            Self::Traffic(e) => Some(e.location),
            Self::Weather(e) => Some(e.location),
        }
    }

    /// Message key: the record id in its string form.
    pub fn key(&self) -> String {
        self.id().to_string()
    }

    /// UTF-8 JSON payload.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let bytes = match self {
            Self::Vehicle(e) => serde_json::to_vec(e)?,
            Self::Gps(e) => serde_json::to_vec(e)?,
            Self::Traffic(e) => serde_json::to_vec(e)?,
            Self::Weather(e) => serde_json::to_vec(e)?,
        };

        Ok(bytes)
    }
}

impl From<VehicleEvent> for TelemetryEvent {
    fn from(value: VehicleEvent) -> Self {
        Self::Vehicle(value)
    }
}

impl From<GpsEvent> for TelemetryEvent {
    fn from(value: GpsEvent) -> Self {
        Self::Gps(value)
    }
}

impl From<TrafficEvent> for TelemetryEvent {
    fn from(value: TrafficEvent) -> Self {
        Self::Traffic(value)
    }
}

impl From<WeatherEvent> for TelemetryEvent {
    fn from(value: WeatherEvent) -> Self {
        Self::Weather(value)
    }
}
