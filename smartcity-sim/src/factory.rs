use chrono::{DateTime, Utc};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use smartcity_core::{
    GpsEvent, Heading, Position, TelemetryEvent, TrafficEvent, VehicleEvent, WeatherCondition,
    WeatherEvent,
};
use uuid::Uuid;

/// Static attributes of the simulated vehicle and its roadside camera.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleProfile {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub fuel_type: String,
    pub vehicle_type: String,
    pub camera_id: String,
    pub snapshot: String,
}

impl Default for VehicleProfile {
    fn default() -> Self {
        Self {
            make: "porsche".to_owned(),
            model: "Model S".to_owned(),
            year: 2024,
            fuel_type: "Hybrid".to_owned(),
            vehicle_type: "private".to_owned(),
            camera_id: "Cam-123".to_owned(),
            snapshot: "Base64EncodedString".to_owned(),
        }
    }
}

/// The four records generated for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickEvents {
    pub vehicle: VehicleEvent,
    pub gps: GpsEvent,
    pub traffic: TrafficEvent,
    pub weather: WeatherEvent,
}

impl TickEvents {
    /// Events in publication order.
    pub fn into_events(self) -> [TelemetryEvent; 4] {
        [
            self.vehicle.into(),
            self.gps.into(),
            self.traffic.into(),
            self.weather.into(),
        ]
    }
}

/// Builds telemetry records for one device from the current tick.
///
/// Ids are UUID v4 drawn from the factory's own seeded generator.
#[derive(Debug, Clone)]
pub struct EventFactory {
    rng: ChaCha8Rng,
    device_id: String,
    direction: String,
    profile: VehicleProfile,
}

impl EventFactory {
    pub fn new(seed: u64, device_id: impl Into<String>, profile: VehicleProfile) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            device_id: device_id.into(),
            direction: Heading::NorthEast.to_string(),
            profile,
        }
    }

    pub fn heading(mut self, heading: Heading) -> Self {
        self.direction = heading.to_string();

        self
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    fn next_id(&mut self) -> Uuid {
        uuid::Builder::from_random_bytes(self.rng.gen()).into_uuid()
    }

    pub fn vehicle(&mut self, location: Position, timestamp: DateTime<Utc>) -> VehicleEvent {
        VehicleEvent {
            id: self.next_id(),
            device_id: self.device_id.to_owned(),
            timestamp,
            location,
            speed: self.rng.gen_range(10.0..=40.0),
            direction: self.direction.to_owned(),
            make: self.profile.make.to_owned(),
            model: self.profile.model.to_owned(),
            year: self.profile.year,
            fuel_type: self.profile.fuel_type.to_owned(),
        }
    }

    pub fn gps(&mut self, timestamp: DateTime<Utc>) -> GpsEvent {
        GpsEvent {
            id: self.next_id(),
            device_id: self.device_id.to_owned(),
            timestamp,
            speed: self.rng.gen_range(0.0..=40.0),
            direction: self.direction.to_owned(),
            vehicle_type: self.profile.vehicle_type.to_owned(),
        }
    }

    pub fn traffic(&mut self, location: Position, timestamp: DateTime<Utc>) -> TrafficEvent {
        TrafficEvent {
            id: self.next_id(),
            device_id: self.device_id.to_owned(),
            camera_id: self.profile.camera_id.to_owned(),
            location,
            timestamp,
            snapshot: self.profile.snapshot.to_owned(),
        }
    }

    pub fn weather(&mut self, location: Position, timestamp: DateTime<Utc>) -> WeatherEvent {
        WeatherEvent {
            id: self.next_id(),
            device_id: self.device_id.to_owned(),
            location,
            timestamp,
            temperature: self.rng.gen_range(-5.0..=25.0),
            weather_condition: *WeatherCondition::ALL
                .choose(&mut self.rng)
                .unwrap_or(&WeatherCondition::Sunny),
            precipitation: self.rng.gen_range(0.0..=25.0),
            windspeed: self.rng.gen_range(0.0..=100.0),
            humidity: self.rng.gen_range(0..=100),
            air_quality_index: self.rng.gen_range(0.0..=500.0),
        }
    }

    /// All four records for one tick, sharing its timestamp and location.
    pub fn tick(&mut self, location: Position, timestamp: DateTime<Utc>) -> TickEvents {
        TickEvents {
            vehicle: self.vehicle(location, timestamp),
            gps: self.gps(timestamp),
            traffic: self.traffic(location, timestamp),
            weather: self.weather(location, timestamp),
        }
    }
}
