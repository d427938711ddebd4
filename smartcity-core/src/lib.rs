//! Data model shared by the smartcity producer and ingestion pipeline.
//!
//! - [`Position`] and [`Heading`] - map coordinates and compass heading
//! - [`VehicleEvent`], [`GpsEvent`], [`TrafficEvent`], [`WeatherEvent`] - what the simulator emits
//! - [`TelemetryEvent`] - closed union of the four, with its wire encoder
//! - [`Topic`] and [`TopicNames`] - the four fixed streams and their broker names
//! - [`schema`] - consumer-side rows with permissive decoding

#![forbid(unsafe_code)]

mod error;
mod event;
mod position;
pub mod schema;
mod topic;

pub use error::*;
pub use event::*;
pub use position::*;
pub use schema::{GpsRow, Schema, TrafficRow, VehicleRow, WeatherRow};
pub use topic::*;
