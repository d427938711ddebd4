use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{BatchCommit, BatchPlan, Checkpoint, CheckpointStore};
use crate::{
    error::{Result, StoreError},
    fs::{list_files, read_optional, write_atomic},
};

/// Checkpoint directory with one file per batch under `offsets/` and one per
/// committed batch under `commits/`.
#[derive(Debug, Clone)]
pub struct FileCheckpoint {
    root: PathBuf,
}

impl FileCheckpoint {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn offsets_path(&self, batch_id: u64) -> PathBuf {
        self.root.join("offsets").join(batch_file(batch_id))
    }

    fn commits_path(&self, batch_id: u64) -> PathBuf {
        self.root.join("commits").join(batch_file(batch_id))
    }
}

fn batch_file(batch_id: u64) -> String {
    format!("{batch_id:020}")
}

fn batch_id(path: &Path) -> Result<u64> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    name.parse()
        .map_err(|_| StoreError::InvalidBatchFile(name))
}

#[async_trait]
impl CheckpointStore for FileCheckpoint {
    async fn latest(&self) -> Result<Option<Checkpoint>> {
        let mut last = None;

        for path in list_files(&self.root.join("offsets")).await? {
            let id = batch_id(&path)?;
            if last.map_or(true, |last| id > last) {
                last = Some(id);
            }
        }

        let Some(id) = last else {
            return Ok(None);
        };

        let Some(bytes) = read_optional(&self.offsets_path(id)).await? else {
            return Ok(None);
        };

        let plan: BatchPlan = serde_json::from_slice(&bytes)?;
        let commit = match read_optional(&self.commits_path(id)).await? {
            Some(bytes) => Some(serde_json::from_slice(&bytes)?),
            None => None,
        };

        Ok(Some(Checkpoint { plan, commit }))
    }

    async fn plan(&self, plan: &BatchPlan) -> Result<()> {
        let path = self.offsets_path(plan.batch_id);

        if let Some(bytes) = read_optional(&path).await? {
            let existing: BatchPlan = serde_json::from_slice(&bytes)?;
            if &existing == plan {
                return Ok(());
            }
        }

        write_atomic(&path, &serde_json::to_vec_pretty(plan)?).await
    }

    async fn commit(&self, commit: &BatchCommit) -> Result<()> {
        if read_optional(&self.offsets_path(commit.batch_id))
            .await?
            .is_none()
        {
            return Err(StoreError::UnplannedCommit {
                batch_id: commit.batch_id,
            });
        }

        write_atomic(
            &self.commits_path(commit.batch_id),
            &serde_json::to_vec_pretty(commit)?,
        )
        .await
    }
}
