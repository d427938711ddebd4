use chrono::{DateTime, TimeDelta, Utc};
use smartcity_core::Schema;
use std::{marker::PhantomData, time::Duration};
use tracing::debug;

use crate::{
    broker::{Broker, InboundMessage, Offsets, TopicConsumer},
    error::Result,
    watermark::{Watermark, WatermarkStatus},
};

#[derive(Debug, Clone, PartialEq)]
pub struct ReaderOptions {
    /// How far behind the maximum event time a record may be.
    pub watermark_delay: TimeDelta,

    /// Records returned by one [`StreamReader::poll`] at most.
    pub max_records_per_poll: usize,

    /// How long one poll waits for the broker.
    pub poll_timeout: Duration,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            watermark_delay: TimeDelta::minutes(2),
            max_records_per_poll: 1000,
            poll_timeout: Duration::from_millis(500),
        }
    }
}

/// One decoded record with its broker position and watermark status.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<S> {
    pub partition: i32,
    pub offset: i64,
    pub key: Option<String>,
    pub record: S,
    pub status: WatermarkStatus,
}

/// Reads one topic, decodes every message with its schema and classifies it
/// against the event-time watermark.
///
/// Starts at the earliest retained offset of every partition until
/// [`StreamReader::seek`] says otherwise.
pub struct StreamReader<S: Schema> {
    consumer: Box<dyn TopicConsumer>,
    watermark: Watermark,
    positions: Offsets,
    options: ReaderOptions,
    _schema: PhantomData<fn() -> S>,
}

impl<S: Schema> StreamReader<S> {
    pub async fn open(broker: &dyn Broker, topic: &str, options: ReaderOptions) -> Result<Self> {
        let mut consumer = broker.consumer(topic).await?;
        consumer.assign(&Offsets::new()).await?;

        Ok(Self {
            consumer,
            watermark: Watermark::new(options.watermark_delay),
            positions: Offsets::new(),
            options,
            _schema: PhantomData,
        })
    }

    pub fn topic(&self) -> &str {
        self.consumer.topic()
    }

    /// Moves to explicit per-partition offsets.
    pub async fn seek(&mut self, offsets: &Offsets) -> Result<()> {
        self.consumer.assign(offsets).await?;
        self.positions = offsets.clone();

        Ok(())
    }

    /// Next offset to read per partition, for every partition read or sought.
    pub fn positions(&self) -> &Offsets {
        &self.positions
    }

    pub fn max_event_time(&self) -> Option<DateTime<Utc>> {
        self.watermark.max_event_time()
    }

    pub fn restore_watermark(&mut self, max_event_time: Option<DateTime<Utc>>) {
        self.watermark.restore(max_event_time);
    }

    pub fn watermark(&self) -> &Watermark {
        &self.watermark
    }

    /// Reads the next records. Never fails on a bad payload: it decodes to a
    /// record of nulls.
    pub async fn poll(&mut self) -> Result<Vec<Envelope<S>>> {
        let messages = self
            .consumer
            .poll(self.options.max_records_per_poll, self.options.poll_timeout)
            .await?;

        for message in messages.iter() {
            self.positions.insert(message.partition, message.offset + 1);
        }

        Ok(self.classify(messages))
    }

    /// Reads `start..end` again, then leaves the reader at `end`.
    ///
    /// Restore the watermark to its value before the range first; the records
    /// are then classified exactly as a single [`StreamReader::poll`] over the
    /// same range did. Gives up after `attempts` consecutive empty reads.
    pub async fn replay(
        &mut self,
        start: &Offsets,
        end: &Offsets,
        attempts: u32,
    ) -> Result<Option<Vec<Envelope<S>>>> {
        self.consumer.assign(start).await?;

        let mut reached = start.clone();
        let mut messages = Vec::new();
        let mut empty = 0;

        while end
            .iter()
            .any(|(partition, offset)| reached.get(partition).map_or(true, |r| r < offset))
        {
            let batch = self
                .consumer
                .poll(self.options.max_records_per_poll, self.options.poll_timeout)
                .await?;

            if batch.is_empty() {
                empty += 1;
                if empty >= attempts {
                    return Ok(None);
                }

                continue;
            }

            empty = 0;

            for message in batch {
                reached.insert(message.partition, message.offset + 1);

                if end
                    .get(&message.partition)
                    .is_some_and(|end| message.offset < *end)
                {
                    messages.push(message);
                }
            }
        }

        self.seek(end).await?;

        Ok(Some(self.classify(messages)))
    }

    /// Decodes in (partition, offset) order and applies the watermark.
    fn classify(&mut self, mut messages: Vec<InboundMessage>) -> Vec<Envelope<S>> {
        messages.sort_by_key(|m| (m.partition, m.offset));

        messages
            .into_iter()
            .map(|message| {
                let record = S::decode(&message.payload);
                let status = self.watermark.observe(record.event_time());

                if status.is_expired() {
                    debug!(
                        topic = %message.topic,
                        partition = message.partition,
                        offset = message.offset,
                        "record behind watermark"
                    );
                }

                Envelope {
                    partition: message.partition,
                    offset: message.offset,
                    key: message.key,
                    record,
                    status,
                }
            })
            .collect()
    }
}
