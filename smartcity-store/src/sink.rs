#[cfg(feature = "memory")]
mod memory;
mod partitioned;

#[cfg(feature = "memory")]
pub use memory::*;
pub use partitioned::*;

use async_trait::async_trait;
use dyn_clone::DynClone;
use serde_json::{Map, Value};

use crate::{error::Result, segment::Segment};

/// Append-only destination of one stream.
#[async_trait]
pub trait Sink: DynClone + Send + Sync {
    /// Writes segments. A segment with the same path as an existing one
    /// replaces it.
    async fn append(&self, segments: Vec<Segment>) -> Result<()>;

    /// Every stored row, in segment path order.
    async fn scan(&self) -> Result<Vec<Map<String, Value>>>;
}

dyn_clone::clone_trait_object!(Sink);
