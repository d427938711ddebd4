use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use super::{Broker, DeliveryReport, InboundMessage, Offsets, OutboundMessage, TopicConsumer};
use crate::error::{MqError, Result};

#[derive(Debug, Clone)]
struct StoredMessage {
    key: String,
    payload: Vec<u8>,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct PartitionLog {
    base_offset: i64,
    messages: Vec<StoredMessage>,
}

impl PartitionLog {
    fn end_offset(&self) -> i64 {
        self.base_offset + self.messages.len() as i64
    }
}

#[derive(Debug, Default)]
struct State {
    topics: HashMap<String, Vec<PartitionLog>>,
    pending: Vec<OutboundMessage>,
    failing_topics: HashSet<String>,
    flush_error: Option<String>,
}

impl State {
    fn partitions_mut(&mut self, topic: &str, count: i32) -> &mut Vec<PartitionLog> {
        self.topics.entry(topic.to_owned()).or_insert_with(|| {
            (0..count).map(|_| PartitionLog::default()).collect()
        })
    }
}

/// In-process broker with partitioned, append-only topic logs.
///
/// Messages become visible to consumers on [`Broker::flush`]. Topics are
/// created on first use with the broker's partition count.
#[derive(Debug, Clone)]
pub struct MemoryBroker {
    partitions: i32,
    state: Arc<RwLock<State>>,
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::with_partitions(1)
    }

    pub fn with_partitions(partitions: i32) -> Self {
        Self {
            partitions: partitions.max(1),
            state: Arc::default(),
        }
    }

    pub fn partitions(&self) -> i32 {
        self.partitions
    }

    /// Partition a key is routed to.
    pub fn partition_for(&self, key: &str) -> i32 {
        let hash = key
            .bytes()
            .fold(0u32, |h, b| h.wrapping_mul(31).wrapping_add(u32::from(b)));

        (hash % self.partitions as u32) as i32
    }

    /// Appends a raw payload directly, bypassing the produce/flush cycle.
    pub fn append(&self, topic: &str, partition: i32, key: &str, payload: Vec<u8>) -> i64 {
        let mut state = self.state.write();
        let logs = state.partitions_mut(topic, self.partitions);
        let log = &mut logs[partition.clamp(0, self.partitions - 1) as usize];
        let offset = log.end_offset();

        log.messages.push(StoredMessage {
            key: key.to_owned(),
            payload,
            timestamp: Utc::now(),
        });

        offset
    }

    /// Drops every message of `partition` below `before`, raising its
    /// earliest retained offset.
    pub fn truncate(&self, topic: &str, partition: i32, before: i64) {
        let mut state = self.state.write();
        let Some(log) = state
            .topics
            .get_mut(topic)
            .and_then(|logs| logs.get_mut(partition as usize))
        else {
            return;
        };

        let before = before.min(log.end_offset());
        if before <= log.base_offset {
            return;
        }

        log.messages.drain(..(before - log.base_offset) as usize);
        log.base_offset = before;
    }

    pub fn earliest_offset(&self, topic: &str, partition: i32) -> Option<i64> {
        let state = self.state.read();
        let log = state.topics.get(topic)?.get(partition as usize)?;

        Some(log.base_offset)
    }

    /// Offset the next message of `partition` will get.
    pub fn end_offset(&self, topic: &str, partition: i32) -> Option<i64> {
        let state = self.state.read();
        let log = state.topics.get(topic)?.get(partition as usize)?;

        Some(log.end_offset())
    }

    /// Every retained message of a topic, partition by partition.
    pub fn messages(&self, topic: &str) -> Vec<InboundMessage> {
        let state = self.state.read();
        let Some(logs) = state.topics.get(topic) else {
            return Vec::new();
        };

        logs.iter()
            .enumerate()
            .flat_map(|(partition, log)| {
                log.messages.iter().enumerate().map(move |(i, m)| InboundMessage {
                    topic: topic.to_owned(),
                    partition: partition as i32,
                    offset: log.base_offset + i as i64,
                    key: Some(m.key.to_owned()),
                    payload: m.payload.clone(),
                    timestamp: Some(m.timestamp),
                })
            })
            .collect()
    }

    /// Makes every later delivery to `topic` fail.
    pub fn fail_deliveries(&self, topic: &str) {
        self.state.write().failing_topics.insert(topic.to_owned());
    }

    /// Makes every later flush fail with `error`, leaving messages queued.
    pub fn fail_flush(&self, error: impl Into<String>) {
        self.state.write().flush_error = Some(error.into());
    }

    pub fn recover(&self) {
        let mut state = self.state.write();
        state.failing_topics.clear();
        state.flush_error = None;
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    async fn produce(&self, message: OutboundMessage) -> Result<()> {
        self.state.write().pending.push(message);

        Ok(())
    }

    async fn flush(&self, _timeout: Duration) -> Result<Vec<DeliveryReport>> {
        let mut state = self.state.write();

        if let Some(error) = state.flush_error.as_ref() {
            return Err(MqError::Flush(error.to_owned()));
        }

        let pending = std::mem::take(&mut state.pending);
        let mut reports = Vec::with_capacity(pending.len());

        for message in pending {
            if state.failing_topics.contains(&message.topic) {
                reports.push(DeliveryReport::Failed {
                    topic: message.topic,
                    key: message.key,
                    error: "delivery rejected by broker".to_owned(),
                });

                continue;
            }

            let partition = self.partition_for(&message.key);
            let log = &mut state.partitions_mut(&message.topic, self.partitions)[partition as usize];
            let offset = log.end_offset();

            log.messages.push(StoredMessage {
                key: message.key,
                payload: message.payload,
                timestamp: Utc::now(),
            });

            reports.push(DeliveryReport::Delivered {
                topic: message.topic,
                partition,
                offset,
            });
        }

        Ok(reports)
    }

    async fn consumer(&self, topic: &str) -> Result<Box<dyn TopicConsumer>> {
        Ok(Box::new(MemoryConsumer {
            topic: topic.to_owned(),
            partitions: self.partitions,
            state: self.state.clone(),
            positions: Offsets::new(),
        }))
    }
}

pub struct MemoryConsumer {
    topic: String,
    partitions: i32,
    state: Arc<RwLock<State>>,
    positions: Offsets,
}

#[async_trait]
impl TopicConsumer for MemoryConsumer {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn assign(&mut self, offsets: &Offsets) -> Result<()> {
        self.positions = offsets.clone();

        Ok(())
    }

    async fn poll(&mut self, max: usize, _timeout: Duration) -> Result<Vec<InboundMessage>> {
        let state = self.state.read();
        let Some(logs) = state.topics.get(&self.topic) else {
            return Ok(Vec::new());
        };

        let mut messages = Vec::new();

        for partition in 0..self.partitions {
            let Some(log) = logs.get(partition as usize) else {
                continue;
            };

            // a position below retention restarts at the earliest retained offset
            let mut position = self
                .positions
                .get(&partition)
                .copied()
                .unwrap_or(log.base_offset)
                .max(log.base_offset);

            while position < log.end_offset() && messages.len() < max {
                let m = &log.messages[(position - log.base_offset) as usize];

                messages.push(InboundMessage {
                    topic: self.topic.to_owned(),
                    partition,
                    offset: position,
                    key: Some(m.key.to_owned()),
                    payload: m.payload.clone(),
                    timestamp: Some(m.timestamp),
                });

                position += 1;
            }

            self.positions.insert(partition, position);
        }

        Ok(messages)
    }
}
