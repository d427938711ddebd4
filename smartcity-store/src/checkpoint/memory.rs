use async_trait::async_trait;
use parking_lot::RwLock;
use std::{collections::BTreeMap, sync::Arc};

use super::{BatchCommit, BatchPlan, Checkpoint, CheckpointStore};
use crate::error::{Result, StoreError};

#[derive(Debug, Default)]
struct Log {
    plans: BTreeMap<u64, BatchPlan>,
    commits: BTreeMap<u64, BatchCommit>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpoint(Arc<RwLock<Log>>);

impl MemoryCheckpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plans(&self) -> Vec<BatchPlan> {
        self.0.read().plans.values().cloned().collect()
    }

    pub fn commits(&self) -> Vec<BatchCommit> {
        self.0.read().commits.values().cloned().collect()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpoint {
    async fn latest(&self) -> Result<Option<Checkpoint>> {
        let log = self.0.read();
        let Some((id, plan)) = log.plans.last_key_value() else {
            return Ok(None);
        };

        Ok(Some(Checkpoint {
            plan: plan.clone(),
            commit: log.commits.get(id).cloned(),
        }))
    }

    async fn plan(&self, plan: &BatchPlan) -> Result<()> {
        self.0.write().plans.insert(plan.batch_id, plan.clone());

        Ok(())
    }

    async fn commit(&self, commit: &BatchCommit) -> Result<()> {
        let mut log = self.0.write();

        if !log.plans.contains_key(&commit.batch_id) {
            return Err(StoreError::UnplannedCommit {
                batch_id: commit.batch_id,
            });
        }

        log.commits.insert(commit.batch_id, commit.clone());

        Ok(())
    }
}
