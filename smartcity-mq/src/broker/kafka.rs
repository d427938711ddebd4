use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use parking_lot::Mutex;
use rdkafka::{
    config::ClientConfig,
    consumer::{Consumer, StreamConsumer},
    producer::{DeliveryFuture, FutureProducer, FutureRecord, Producer},
    Message, Offset, TopicPartitionList,
};
use std::{sync::Arc, time::Duration};
use tokio::time::{timeout_at, Instant};
use tracing::debug;

use super::{Broker, DeliveryReport, InboundMessage, Offsets, OutboundMessage, TopicConsumer};
use crate::error::{MqError, Result};

struct InFlight {
    topic: String,
    key: String,
    delivery: DeliveryFuture,
}

/// Kafka engine backed by rdkafka.
#[derive(Clone)]
pub struct KafkaBroker {
    config: ClientConfig,
    producer: FutureProducer,
    in_flight: Arc<Mutex<Vec<InFlight>>>,
}

impl KafkaBroker {
    pub fn new(bootstrap_servers: impl Into<String>) -> Result<Self> {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", bootstrap_servers.into())
            .set("message.timeout.ms", "5000");

        Self::with_config(config)
    }

    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let producer: FutureProducer = config.create()?;

        Ok(Self {
            config,
            producer,
            in_flight: Arc::default(),
        })
    }
}

#[async_trait]
impl Broker for KafkaBroker {
    async fn produce(&self, message: OutboundMessage) -> Result<()> {
        let record = FutureRecord::to(&message.topic)
            .key(&message.key)
            .payload(&message.payload);

        let delivery = self
            .producer
            .send_result(record)
            .map_err(|(e, _)| MqError::Broker(e.to_string()))?;

        self.in_flight.lock().push(InFlight {
            topic: message.topic,
            key: message.key,
            delivery,
        });

        Ok(())
    }

    async fn flush(&self, timeout: Duration) -> Result<Vec<DeliveryReport>> {
        let producer = self.producer.clone();

        tokio::task::spawn_blocking(move || producer.flush(timeout))
            .await
            .map_err(|e| MqError::Flush(e.to_string()))?
            .map_err(|e| MqError::Flush(e.to_string()))?;

        let in_flight = std::mem::take(&mut *self.in_flight.lock());
        let deliveries = in_flight.into_iter().map(|f| async move {
            match f.delivery.await {
                Ok(Ok((partition, offset))) => DeliveryReport::Delivered {
                    topic: f.topic,
                    partition,
                    offset,
                },
                Ok(Err((e, _))) => DeliveryReport::Failed {
                    topic: f.topic,
                    key: f.key,
                    error: e.to_string(),
                },
                Err(_) => DeliveryReport::Failed {
                    topic: f.topic,
                    key: f.key,
                    error: "delivery future canceled".to_owned(),
                },
            }
        });

        Ok(join_all(deliveries).await)
    }

    async fn consumer(&self, topic: &str) -> Result<Box<dyn TopicConsumer>> {
        let consumer: StreamConsumer = self
            .config
            .clone()
            .set("group.id", format!("smartcity-{topic}"))
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .create()?;

        Ok(Box::new(KafkaConsumer {
            topic: topic.to_owned(),
            consumer: Arc::new(consumer),
        }))
    }
}

pub struct KafkaConsumer {
    topic: String,
    consumer: Arc<StreamConsumer>,
}

impl KafkaConsumer {
    async fn partitions(&self) -> Result<Vec<i32>> {
        let consumer = self.consumer.clone();
        let topic = self.topic.to_owned();

        let metadata = tokio::task::spawn_blocking(move || {
            consumer.fetch_metadata(Some(&topic), Duration::from_secs(10))
        })
        .await
        .map_err(|e| MqError::Broker(e.to_string()))??;

        Ok(metadata
            .topics()
            .iter()
            .filter(|t| t.name() == self.topic)
            .flat_map(|t| t.partitions().iter().map(|p| p.id()))
            .collect())
    }
}

#[async_trait]
impl TopicConsumer for KafkaConsumer {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn assign(&mut self, offsets: &Offsets) -> Result<()> {
        let mut list = TopicPartitionList::new();

        for partition in self.partitions().await? {
            let offset = match offsets.get(&partition) {
                Some(offset) => Offset::Offset(*offset),
                None => Offset::Beginning,
            };

            list.add_partition_offset(&self.topic, partition, offset)?;
        }

        debug!(topic = %self.topic, partitions = list.count(), "assign");
        self.consumer.assign(&list)?;

        Ok(())
    }

    async fn poll(&mut self, max: usize, timeout: Duration) -> Result<Vec<InboundMessage>> {
        let deadline = Instant::now() + timeout;
        let mut messages = Vec::new();

        while messages.len() < max {
            let message = match timeout_at(deadline, self.consumer.recv()).await {
                Ok(message) => message?,
                Err(_) => break,
            };

            messages.push(InboundMessage {
                topic: message.topic().to_owned(),
                partition: message.partition(),
                offset: message.offset(),
                key: message
                    .key()
                    .map(|k| String::from_utf8_lossy(k).into_owned()),
                payload: message.payload().map(<[u8]>::to_vec).unwrap_or_default(),
                timestamp: message
                    .timestamp()
                    .to_millis()
                    .and_then(DateTime::<Utc>::from_timestamp_millis),
            });
        }

        Ok(messages)
    }
}
