use async_trait::async_trait;
use smartcity_core::{GpsRow, Schema, Topic, TrafficRow, VehicleRow, WeatherRow};
use smartcity_mq::{Broker, ReaderOptions, StreamReader};
use smartcity_store::{FileCheckpoint, PartitionedSink, StreamWriter};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::IngestConfig;

/// A long-running unit of work supervised by the
/// [`Orchestrator`](crate::Orchestrator).
#[async_trait]
pub trait Job: Send {
    fn name(&self) -> String;

    /// Runs until `token` is cancelled or the job fails.
    async fn run(self: Box<Self>, token: CancellationToken) -> anyhow::Result<()>;
}

/// Reads one topic and writes it to storage.
pub struct Pipeline<S: Schema> {
    broker: Box<dyn Broker>,
    topic: String,
    reader: ReaderOptions,
    writer: StreamWriter<S>,
}

impl<S: Schema> Pipeline<S> {
    pub fn new<B: Broker + 'static>(
        broker: B,
        topic: impl Into<String>,
        reader: ReaderOptions,
        writer: StreamWriter<S>,
    ) -> Self {
        Self {
            broker: Box::new(broker),
            topic: topic.into(),
            reader,
            writer,
        }
    }

    /// Pipeline with file checkpoints and partitioned storage laid out by
    /// `config`.
    pub fn from_config<B: Broker + 'static>(broker: B, config: &IngestConfig) -> Self {
        let topic = config.topics.name(S::TOPIC).to_owned();
        let writer = StreamWriter::new(
            FileCheckpoint::new(config.layout.checkpoint_dir(&topic)),
            PartitionedSink::new(config.layout.output_dir(&topic)),
        )
        .options(config.writer.clone());

        Self::new(broker, topic, config.reader.clone(), writer)
    }
}

#[async_trait]
impl<S: Schema> Job for Pipeline<S> {
    fn name(&self) -> String {
        self.topic.to_owned()
    }

    async fn run(self: Box<Self>, token: CancellationToken) -> anyhow::Result<()> {
        let Pipeline {
            broker,
            topic,
            reader,
            mut writer,
        } = *self;

        let mut reader = StreamReader::<S>::open(broker.as_ref(), &topic, reader).await?;
        let recovery = writer.recover(&mut reader).await?;
        info!(topic = %topic, ?recovery, "pipeline started");

        writer.write(&mut reader, &token).await?;
        info!(topic = %topic, "pipeline stopped");

        Ok(())
    }
}

/// The four topic pipelines, in topic order.
pub fn pipelines<B>(broker: B, config: &IngestConfig) -> Vec<Box<dyn Job>>
where
    B: Broker + Clone + 'static,
{
    Topic::ALL
        .into_iter()
        .map(|topic| -> Box<dyn Job> {
            match topic {
                Topic::Vehicle => Box::new(Pipeline::<VehicleRow>::from_config(broker.clone(), config)),
                Topic::Gps => Box::new(Pipeline::<GpsRow>::from_config(broker.clone(), config)),
                Topic::Traffic => Box::new(Pipeline::<TrafficRow>::from_config(broker.clone(), config)),
                Topic::Weather => Box::new(Pipeline::<WeatherRow>::from_config(broker.clone(), config)),
            }
        })
        .collect()
}
