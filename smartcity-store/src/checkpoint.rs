mod file;
#[cfg(feature = "memory")]
mod memory;

pub use file::*;
#[cfg(feature = "memory")]
pub use memory::*;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dyn_clone::DynClone;
use serde::{Deserialize, Serialize};
use smartcity_mq::Offsets;

use crate::error::Result;

/// A micro-batch as planned before any of its data is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPlan {
    pub batch_id: u64,

    /// First offset of the batch per partition.
    pub start: Offsets,

    /// Offset after the last record of the batch per partition.
    pub end: Offsets,

    /// Maximum event time seen before the batch.
    pub max_event_time: Option<DateTime<Utc>>,
}

/// Marks a planned batch as fully written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCommit {
    pub batch_id: u64,

    /// Maximum event time seen after the batch.
    pub max_event_time: Option<DateTime<Utc>>,

    pub rows: usize,
    pub committed_at: DateTime<Utc>,
}

/// The most recent batch of a checkpoint and its commit marker, if written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub plan: BatchPlan,
    pub commit: Option<BatchCommit>,
}

impl Checkpoint {
    pub fn is_committed(&self) -> bool {
        self.commit
            .as_ref()
            .is_some_and(|c| c.batch_id == self.plan.batch_id)
    }
}

/// Write-ahead log of micro-batches for one stream.
#[async_trait]
pub trait CheckpointStore: DynClone + Send + Sync {
    async fn latest(&self) -> Result<Option<Checkpoint>>;

    /// Persists a plan. Writing the same plan again is a no-op.
    async fn plan(&self, plan: &BatchPlan) -> Result<()>;

    async fn commit(&self, commit: &BatchCommit) -> Result<()>;
}

dyn_clone::clone_trait_object!(CheckpointStore);
