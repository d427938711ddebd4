#[cfg(feature = "kafka")]
mod kafka;
#[cfg(feature = "kafka")]
pub use kafka::*;

#[cfg(feature = "memory")]
mod memory;
#[cfg(feature = "memory")]
pub use memory::*;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dyn_clone::DynClone;
use std::{collections::BTreeMap, time::Duration};

use crate::error::Result;

/// Next offset to read, per partition.
pub type Offsets = BTreeMap<i32, i64>;

/// A keyed message waiting to be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub topic: String,
    pub key: String,
    pub payload: Vec<u8>,
}

/// A message read back from one partition of a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<String>,
    pub payload: Vec<u8>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Outcome of producing one message, known once the broker acknowledged it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryReport {
    Delivered {
        topic: String,
        partition: i32,
        offset: i64,
    },
    Failed {
        topic: String,
        key: String,
        error: String,
    },
}

impl DeliveryReport {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryReport::Delivered { .. })
    }

    pub fn topic(&self) -> &str {
        match self {
            DeliveryReport::Delivered { topic, .. } | DeliveryReport::Failed { topic, .. } => topic,
        }
    }
}

#[async_trait]
pub trait Broker: DynClone + Send + Sync {
    /// Enqueues a message; nothing is acknowledged before [`Broker::flush`].
    async fn produce(&self, message: OutboundMessage) -> Result<()>;

    /// Waits until every enqueued message was acknowledged or failed.
    async fn flush(&self, timeout: Duration) -> Result<Vec<DeliveryReport>>;

    async fn consumer(&self, topic: &str) -> Result<Box<dyn TopicConsumer>>;
}

dyn_clone::clone_trait_object!(Broker);

/// Reads every partition of one topic.
#[async_trait]
pub trait TopicConsumer: Send + Sync {
    fn topic(&self) -> &str;

    /// Positions the consumer. Partitions absent from `offsets` start at the
    /// earliest retained offset.
    async fn assign(&mut self, offsets: &Offsets) -> Result<()>;

    /// Returns at most `max` messages, in offset order within each partition.
    async fn poll(&mut self, max: usize, timeout: Duration) -> Result<Vec<InboundMessage>>;
}
