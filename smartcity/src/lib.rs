//! Fleet telemetry simulator and ingestion pipeline.
//!
//! The producer side runs a [`Journey`]: a seeded vehicle moving from origin to
//! destination, publishing vehicle, gps, traffic and weather records on every
//! tick. The consumer side runs one [`Pipeline`] per topic under an
//! [`Orchestrator`], writing each stream exactly once to time-partitioned
//! storage.
//!
//! ```no_run
//! use smartcity::{pipelines, IngestConfig, Orchestrator, StorageLayout};
//! use smartcity_mq::MemoryBroker;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let broker = MemoryBroker::new();
//! let config = IngestConfig {
//!     layout: StorageLayout::under("/var/lib/smartcity"),
//!     ..Default::default()
//! };
//!
//! Orchestrator::default()
//!     .jobs(pipelines(broker, &config))
//!     .run()
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod cli;
mod config;
mod journey;
mod logging;
mod orchestrator;
mod pipeline;
mod scheduler;

pub use config::*;
pub use journey::*;
pub use logging::*;
pub use orchestrator::*;
pub use pipeline::*;
pub use scheduler::*;

pub use tokio_util::sync::CancellationToken;
