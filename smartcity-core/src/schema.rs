//! Consumer-side view of the four topics.
//!
//! Every topic has a fixed list of [`Field`]s and a row type whose fields are
//! all optional. Decoding never fails: a field that is missing, malformed or of
//! the wrong type decodes to `None`, and a payload that is not a JSON object
//! decodes to a row where every field is `None`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use std::fmt::Debug;

use crate::{GpsEvent, Position, Topic, TrafficEvent, VehicleEvent, WeatherEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Timestamp,
    Double,
    Integer,
    Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
}

const fn field(name: &'static str, ty: FieldType) -> Field {
    Field { name, ty }
}

/// A typed, permissively decoded record of one topic.
pub trait Schema: Debug + Clone + Send + Sync + 'static {
    const TOPIC: Topic;
    const FIELDS: &'static [Field];

    fn decode(payload: &[u8]) -> Self;

    /// The value the watermark is computed on.
    fn event_time(&self) -> Option<DateTime<Utc>>;

    /// Column values in [`Schema::FIELDS`] order, `Value::Null` for missing ones.
    fn values(&self) -> Vec<Value>;
}

/// Typed accessors over a decoded JSON object; every mismatch is `None`.
pub struct Fields(Option<Map<String, Value>>);

impl Fields {
    pub fn parse(payload: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(payload) {
            Ok(Value::Object(map)) => Self(Some(map)),
            _ => Self(None),
        }
    }

    fn get(&self, name: &str) -> Option<&Value> {
        self.0.as_ref().and_then(|map| map.get(name))
    }

    pub fn string(&self, name: &str) -> Option<String> {
        self.get(name)?.as_str().map(ToOwned::to_owned)
    }

    pub fn double(&self, name: &str) -> Option<f64> {
        self.get(name)?.as_f64()
    }

    pub fn integer(&self, name: &str) -> Option<i32> {
        self.get(name)?
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
    }

    pub fn timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        parse_timestamp(self.get(name)?.as_str()?)
    }

    pub fn position(&self, name: &str) -> Option<Position> {
        match self.get(name)? {
            Value::Array(pair) if pair.len() == 2 => {
                Some(Position::new(pair[0].as_f64()?, pair[1].as_f64()?))
            }
            Value::Object(map) => Some(Position::new(
                map.get("latitude")?.as_f64()?,
                map.get("longitude")?.as_f64()?,
            )),
            _ => None,
        }
    }
}

/// RFC 3339, or a naive ISO-8601 date-time taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn string_value(v: &Option<String>) -> Value {
    v.as_ref().map_or(Value::Null, |s| Value::String(s.to_owned()))
}

fn double_value(v: Option<f64>) -> Value {
    v.map_or(Value::Null, Value::from)
}

fn integer_value(v: Option<i32>) -> Value {
    v.map_or(Value::Null, Value::from)
}

fn timestamp_value(v: Option<DateTime<Utc>>) -> Value {
    v.map_or(Value::Null, |ts| Value::String(ts.to_rfc3339()))
}

fn position_value(v: Option<Position>) -> Value {
    v.map_or(Value::Null, |p| {
        Value::Array(vec![Value::from(p.latitude), Value::from(p.longitude)])
    })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleRow {
    pub id: Option<String>,
    pub device_id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub location: Option<Position>,
    pub speed: Option<f64>,
    pub direction: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub fuel_type: Option<String>,
}

impl Schema for VehicleRow {
    const TOPIC: Topic = Topic::Vehicle;
    const FIELDS: &'static [Field] = &[
        field("id", FieldType::String),
        field("deviceID", FieldType::String),
        field("timestamp", FieldType::Timestamp),
        field("location", FieldType::Position),
        field("speed", FieldType::Double),
        field("direction", FieldType::String),
        field("make", FieldType::String),
        field("model", FieldType::String),
        field("year", FieldType::Integer),
        field("fuelType", FieldType::String),
    ];

    fn decode(payload: &[u8]) -> Self {
        let f = Fields::parse(payload);

        Self {
            id: f.string("id"),
            device_id: f.string("deviceID"),
            timestamp: f.timestamp("timestamp"),
            location: f.position("location"),
            speed: f.double("speed"),
            direction: f.string("direction"),
            make: f.string("make"),
            model: f.string("model"),
            year: f.integer("year"),
            fuel_type: f.string("fuelType"),
        }
    }

    fn event_time(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    fn values(&self) -> Vec<Value> {
        vec![
            string_value(&self.id),
            string_value(&self.device_id),
            timestamp_value(self.timestamp),
            position_value(self.location),
            double_value(self.speed),
            string_value(&self.direction),
            string_value(&self.make),
            string_value(&self.model),
            integer_value(self.year),
            string_value(&self.fuel_type),
        ]
    }
}

impl From<&VehicleEvent> for VehicleRow {
    fn from(e: &VehicleEvent) -> Self {
        Self {
            id: Some(e.id.to_string()),
            device_id: Some(e.device_id.to_owned()),
            timestamp: Some(e.timestamp),
            location: Some(e.location),
            speed: Some(e.speed),
            direction: Some(e.direction.to_owned()),
            make: Some(e.make.to_owned()),
            model: Some(e.model.to_owned()),
            year: Some(e.year),
            fuel_type: Some(e.fuel_type.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpsRow {
    pub id: Option<String>,
    pub device_id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub speed: Option<f64>,
    pub direction: Option<String>,
    pub vehicle_type: Option<String>,
}

impl Schema for GpsRow {
    const TOPIC: Topic = Topic::Gps;
    const FIELDS: &'static [Field] = &[
        field("id", FieldType::String),
        field("deviceID", FieldType::String),
        field("timestamp", FieldType::Timestamp),
        field("speed", FieldType::Double),
        field("direction", FieldType::String),
        field("vehicle_type", FieldType::String),
    ];

    fn decode(payload: &[u8]) -> Self {
        let f = Fields::parse(payload);

        Self {
            id: f.string("id"),
            device_id: f.string("deviceID"),
            timestamp: f.timestamp("timestamp"),
            speed: f.double("speed"),
            direction: f.string("direction"),
            vehicle_type: f.string("vehicle_type"),
        }
    }

    fn event_time(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    fn values(&self) -> Vec<Value> {
        vec![
            string_value(&self.id),
            string_value(&self.device_id),
            timestamp_value(self.timestamp),
            double_value(self.speed),
            string_value(&self.direction),
            string_value(&self.vehicle_type),
        ]
    }
}

impl From<&GpsEvent> for GpsRow {
    fn from(e: &GpsEvent) -> Self {
        Self {
            id: Some(e.id.to_string()),
            device_id: Some(e.device_id.to_owned()),
            timestamp: Some(e.timestamp),
            speed: Some(e.speed),
            direction: Some(e.direction.to_owned()),
            vehicle_type: Some(e.vehicle_type.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrafficRow {
    pub id: Option<String>,
    pub device_id: Option<String>,
    pub camera_id: Option<String>,
    pub location: Option<Position>,
    pub timestamp: Option<DateTime<Utc>>,
    pub snapshot: Option<String>,
}

impl Schema for TrafficRow {
    const TOPIC: Topic = Topic::Traffic;
    const FIELDS: &'static [Field] = &[
        field("id", FieldType::String),
        field("deviceID", FieldType::String),
        field("cameraID", FieldType::String),
        field("location", FieldType::Position),
        field("timestamp", FieldType::Timestamp),
        field("snapshot", FieldType::String),
    ];

    fn decode(payload: &[u8]) -> Self {
        let f = Fields::parse(payload);

        Self {
            id: f.string("id"),
            device_id: f.string("deviceID"),
            camera_id: f.string("cameraID"),
            location: f.position("location"),
            timestamp: f.timestamp("timestamp"),
            snapshot: f.string("snapshot"),
        }
    }

    fn event_time(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    fn values(&self) -> Vec<Value> {
        vec![
            string_value(&self.id),
            string_value(&self.device_id),
            string_value(&self.camera_id),
            position_value(self.location),
            timestamp_value(self.timestamp),
            string_value(&self.snapshot),
        ]
    }
}

impl From<&TrafficEvent> for TrafficRow {
    fn from(e: &TrafficEvent) -> Self {
        Self {
            id: Some(e.id.to_string()),
            device_id: Some(e.device_id.to_owned()),
            camera_id: Some(e.camera_id.to_owned()),
            location: Some(e.location),
            timestamp: Some(e.timestamp),
            snapshot: Some(e.snapshot.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherRow {
    pub id: Option<String>,
    pub device_id: Option<String>,
    pub location: Option<Position>,
    pub timestamp: Option<DateTime<Utc>>,
    pub temperature: Option<f64>,
    pub weather_condition: Option<String>,
    pub precipitation: Option<f64>,
    pub windspeed: Option<f64>,
    pub humidity: Option<i32>,
    pub air_quality_index: Option<f64>,
}

impl Schema for WeatherRow {
    const TOPIC: Topic = Topic::Weather;
    const FIELDS: &'static [Field] = &[
        field("id", FieldType::String),
        field("deviceID", FieldType::String),
        field("location", FieldType::Position),
        field("timestamp", FieldType::Timestamp),
        field("temperature", FieldType::Double),
        field("weatherCondition", FieldType::String),
        field("precipitation", FieldType::Double),
        field("windspeed", FieldType::Double),
        field("humidity", FieldType::Integer),
        field("airQualityIndex", FieldType::Double),
    ];

    fn decode(payload: &[u8]) -> Self {
        let f = Fields::parse(payload);

        Self {
            id: f.string("id"),
            device_id: f.string("deviceID"),
            location: f.position("location"),
            timestamp: f.timestamp("timestamp"),
            temperature: f.double("temperature"),
            weather_condition: f.string("weatherCondition"),
            precipitation: f.double("precipitation"),
            windspeed: f.double("windspeed"),
            humidity: f.integer("humidity"),
            air_quality_index: f.double("airQualityIndex"),
        }
    }

    fn event_time(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    fn values(&self) -> Vec<Value> {
        vec![
            string_value(&self.id),
            string_value(&self.device_id),
            position_value(self.location),
            timestamp_value(self.timestamp),
            double_value(self.temperature),
            string_value(&self.weather_condition),
            double_value(self.precipitation),
            double_value(self.windspeed),
            integer_value(self.humidity),
            double_value(self.air_quality_index),
        ]
    }
}

impl From<&WeatherEvent> for WeatherRow {
    fn from(e: &WeatherEvent) -> Self {
        Self {
            id: Some(e.id.to_string()),
            device_id: Some(e.device_id.to_owned()),
            location: Some(e.location),
            timestamp: Some(e.timestamp),
            temperature: Some(e.temperature),
            weather_condition: Some(e.weather_condition.as_str().to_owned()),
            precipitation: Some(e.precipitation),
            windspeed: Some(e.windspeed),
            humidity: Some(e.humidity),
            air_quality_index: Some(e.air_quality_index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn naive_timestamps_are_utc() {
        let ts = parse_timestamp("2024-03-01T10:15:30.250000").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-03-01T10:15:30.250+00:00");

        let ts = parse_timestamp("2024-03-01T10:15:30").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-03-01T10:15:30+00:00");

        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn integer_rejects_fractions_and_overflow() {
        let f = Fields::parse(br#"{"a": 3.5, "b": 4294967296, "c": 12}"#);

        assert_eq!(f.integer("a"), None);
        assert_eq!(f.integer("b"), None);
        assert_eq!(f.integer("c"), Some(12));
    }

    #[test]
    fn position_accepts_pair_and_object() {
        let f = Fields::parse(
            br#"{"a": [1.5, 2.5], "b": {"latitude": 3.0, "longitude": 4.0}, "c": [1.0], "d": "1,2"}"#,
        );

        assert_eq!(f.position("a"), Some(Position::new(1.5, 2.5)));
        assert_eq!(f.position("b"), Some(Position::new(3.0, 4.0)));
        assert_eq!(f.position("c"), None);
        assert_eq!(f.position("d"), None);
    }
}
