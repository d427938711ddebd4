use chrono::{DateTime, Utc};
use smartcity_core::TopicNames;
use smartcity_mq::ReaderOptions;
use smartcity_sim::{Route, SimulatorConfig, VehicleProfile};
use smartcity_store::WriterOptions;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tokio_util::sync::CancellationToken;

use crate::scheduler::Scheduler;

/// Where each stream keeps its checkpoint and its data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageLayout {
    pub checkpoint_root: PathBuf,
    pub data_root: PathBuf,
}

impl StorageLayout {
    pub fn new(checkpoint_root: impl Into<PathBuf>, data_root: impl Into<PathBuf>) -> Self {
        Self {
            checkpoint_root: checkpoint_root.into(),
            data_root: data_root.into(),
        }
    }

    /// All under one directory: `<root>/checkpoints` and `<root>/data`.
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();

        Self::new(root.join("checkpoints"), root.join("data"))
    }

    pub fn checkpoint_dir(&self, topic: &str) -> PathBuf {
        self.checkpoint_root.join(topic)
    }

    pub fn output_dir(&self, topic: &str) -> PathBuf {
        self.data_root.join(topic)
    }
}

impl Default for StorageLayout {
    fn default() -> Self {
        Self::new("checkpoints", "data")
    }
}

/// Producer process configuration.
#[derive(Clone, Debug)]
pub struct ProducerConfig {
    pub device_id: String,

    /// Seeds both the journey and the generated records.
    pub seed: u64,

    pub route: Route,

    /// Simulated start time; the wall clock when `None`.
    pub start: Option<DateTime<Utc>>,

    /// Real time between two ticks.
    pub tick_interval: Duration,

    /// Stop publishing after this much real time.
    pub deadline: Option<Duration>,

    pub simulator: SimulatorConfig,
    pub profile: VehicleProfile,
    pub topics: TopicNames,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            device_id: "vehicle-car-1".to_owned(),
            seed: 42,
            route: Route::reference(),
            start: None,
            tick_interval: Duration::from_secs(5),
            deadline: None,
            simulator: SimulatorConfig::default(),
            profile: VehicleProfile::default(),
            topics: TopicNames::default(),
        }
    }
}

impl ProducerConfig {
    /// Scheduler pacing ticks by `tick_interval`, bounded by `deadline` from
    /// now when one is set.
    pub fn scheduler(&self, token: CancellationToken) -> Scheduler {
        let scheduler = Scheduler::new(self.tick_interval, token);

        match self.deadline {
            Some(after) => scheduler.deadline(after),
            None => scheduler,
        }
    }
}

/// Consumer process configuration.
#[derive(Clone, Debug, Default)]
pub struct IngestConfig {
    pub layout: StorageLayout,
    pub topics: TopicNames,
    pub reader: ReaderOptions,
    pub writer: WriterOptions,
}
