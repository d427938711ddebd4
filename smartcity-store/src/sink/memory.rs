use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use super::Sink;
use crate::{error::Result, segment::Segment};

#[derive(Debug, Clone, Default)]
pub struct MemorySink(Arc<RwLock<BTreeMap<PathBuf, Segment>>>);

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> Vec<Segment> {
        self.0.read().values().cloned().collect()
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn append(&self, segments: Vec<Segment>) -> Result<()> {
        let mut data = self.0.write();

        for segment in segments {
            data.insert(segment.path(), segment);
        }

        Ok(())
    }

    async fn scan(&self) -> Result<Vec<Map<String, Value>>> {
        Ok(self.0.read().values().flat_map(Segment::rows).collect())
    }
}
