//! Exactly-once persistence of telemetry streams.
//!
//! A [`StreamWriter`] turns what a [`StreamReader`](smartcity_mq::StreamReader)
//! yields into micro-batches. Each batch is planned in a [`CheckpointStore`]
//! before its [`Segment`]s reach the [`Sink`] and committed afterwards, so a
//! crash between the two is repaired by replaying the same offsets into the
//! same files.

#![forbid(unsafe_code)]

mod checkpoint;
mod error;
mod fs;
mod segment;
mod sink;
mod writer;

pub use checkpoint::*;
pub use error::*;
pub use segment::*;
pub use sink::*;
pub use writer::*;
