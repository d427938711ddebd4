use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use super::Sink;
use crate::{
    error::{Result, StoreError},
    fs::{walk, write_atomic},
    segment::Segment,
};

/// Writes segments as files under time-partitioned directories of `root`.
#[derive(Debug, Clone)]
pub struct PartitionedSink {
    root: PathBuf,
}

impl PartitionedSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every segment file currently stored.
    pub async fn segments(&self) -> Result<Vec<Segment>> {
        let mut segments = Vec::new();

        for path in walk(&self.root).await? {
            let bytes = tokio::fs::read(&path).await?;
            let segment: Segment = serde_json::from_slice(&bytes)?;

            segment
                .validate()
                .map_err(|reason| StoreError::InvalidSegment {
                    path: path.display().to_string(),
                    reason,
                })?;

            segments.push(segment);
        }

        Ok(segments)
    }
}

#[async_trait]
impl Sink for PartitionedSink {
    async fn append(&self, segments: Vec<Segment>) -> Result<()> {
        for segment in segments {
            let path = self.root.join(segment.path());
            write_atomic(&path, &serde_json::to_vec(&segment)?).await?;
        }

        Ok(())
    }

    async fn scan(&self) -> Result<Vec<Map<String, Value>>> {
        Ok(self
            .segments()
            .await?
            .iter()
            .flat_map(Segment::rows)
            .collect())
    }
}
