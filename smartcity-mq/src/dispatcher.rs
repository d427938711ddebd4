use smartcity_core::{TelemetryEvent, TopicNames};
use std::time::Duration;
use tracing::{error, info};

use crate::{
    broker::{Broker, DeliveryReport, OutboundMessage},
    error::Result,
};

/// Observes delivery outcomes. Never changes what `publish` returns.
pub trait DeliveryHandler: Send + Sync {
    fn handle(&self, report: &DeliveryReport);
}

impl<F> DeliveryHandler for F
where
    F: Fn(&DeliveryReport) + Send + Sync,
{
    fn handle(&self, report: &DeliveryReport) {
        self(report)
    }
}

/// Logs every delivery outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDelivery;

impl DeliveryHandler for LogDelivery {
    fn handle(&self, report: &DeliveryReport) {
        match report {
            DeliveryReport::Delivered {
                topic,
                partition,
                offset,
            } => info!("message delivered to {topic} [{partition}] at offset {offset}"),
            DeliveryReport::Failed { topic, key, error } => {
                error!("message delivery to {topic} failed for key {key}: {error}")
            }
        }
    }
}

/// Serializes telemetry events and publishes them keyed by id, flushing
/// after every message.
pub struct Dispatcher {
    broker: Box<dyn Broker>,
    handler: Box<dyn DeliveryHandler>,
    topics: TopicNames,
    flush_timeout: Duration,
}

impl Dispatcher {
    pub fn new<B: Broker + 'static>(broker: B) -> Self {
        Self {
            broker: Box::new(broker),
            handler: Box::new(LogDelivery),
            topics: TopicNames::default(),
            flush_timeout: Duration::from_secs(10),
        }
    }

    pub fn handler<H: DeliveryHandler + 'static>(mut self, handler: H) -> Self {
        self.handler = Box::new(handler);

        self
    }

    pub fn topics(mut self, topics: TopicNames) -> Self {
        self.topics = topics;

        self
    }

    pub fn flush_timeout(mut self, timeout: Duration) -> Self {
        self.flush_timeout = timeout;

        self
    }

    /// Publishes one event to `topic` and waits for its delivery report.
    ///
    /// A failed delivery is reported, not returned as an error. A failed
    /// flush is an error.
    pub async fn publish(&self, topic: &str, event: &TelemetryEvent) -> Result<Vec<DeliveryReport>> {
        let message = OutboundMessage {
            topic: topic.to_owned(),
            key: event.key(),
            payload: event.encode()?,
        };

        self.broker.produce(message).await?;

        let reports = self.broker.flush(self.flush_timeout).await?;

        for report in reports.iter() {
            self.handler.handle(report);
        }

        Ok(reports)
    }

    /// Publishes the events of one tick, each to its kind's topic, in order.
    pub async fn publish_tick<I>(&self, events: I) -> Result<Vec<DeliveryReport>>
    where
        I: IntoIterator<Item = TelemetryEvent>,
    {
        let mut reports = Vec::new();

        for event in events {
            let topic = self.topics.name(event.topic()).to_owned();
            reports.extend(self.publish(&topic, &event).await?);
        }

        Ok(reports)
    }
}
