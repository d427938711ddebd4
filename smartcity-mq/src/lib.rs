//! Broker plumbing for smartcity telemetry.
//!
//! The producer side publishes [`TelemetryEvent`](smartcity_core::TelemetryEvent)s
//! through a [`Dispatcher`]; the consumer side reads one topic with a
//! [`StreamReader`], which decodes permissively and applies a [`Watermark`].
//! Both talk to a [`Broker`] engine: [`MemoryBroker`] (feature `memory`) or
//! `KafkaBroker` (feature `kafka`).

#![forbid(unsafe_code)]

mod broker;
mod dispatcher;
mod error;
mod reader;
mod watermark;

pub use broker::*;
pub use dispatcher::*;
pub use error::*;
pub use reader::*;
pub use watermark::*;
