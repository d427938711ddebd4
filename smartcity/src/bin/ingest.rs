//! Streams the four telemetry topics from Kafka into partitioned storage.
//!
//! ```text
//! cargo run --features kafka --bin smartcity-ingest -- --data-dir data
//! cargo run --features kafka --bin smartcity-ingest -- --inspect
//! ```

use clap::Parser;
use smartcity::{
    cli::{BrokerArgs, StorageArgs, TopicArgs},
    init_tracing, pipelines, CancellationToken, IngestConfig, Orchestrator,
};
use smartcity_core::Topic;
use smartcity_mq::KafkaBroker;
use smartcity_store::{PartitionedSink, Sink, WriterOptions};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "smartcity-ingest")]
#[command(about = "Ingest telemetry topics into time-partitioned storage")]
struct Args {
    #[command(flatten)]
    broker: BrokerArgs,

    #[command(flatten)]
    topics: TopicArgs,

    #[command(flatten)]
    storage: StorageArgs,

    /// Milliseconds between two micro-batches
    #[arg(long, default_value_t = 500)]
    trigger_ms: u64,

    /// Print the stored row count of every topic and exit
    #[arg(long)]
    inspect: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let args = Args::parse();
    let config = IngestConfig {
        layout: args.storage.into(),
        topics: args.topics.into(),
        writer: WriterOptions {
            trigger_interval: Duration::from_millis(args.trigger_ms),
            ..Default::default()
        },
        ..Default::default()
    };

    if args.inspect {
        for topic in Topic::ALL {
            let name = config.topics.name(topic);
            let rows = PartitionedSink::new(config.layout.output_dir(name))
                .scan()
                .await?;

            println!("{name}: {} rows", rows.len());
        }

        return Ok(());
    }

    let token = CancellationToken::new();
    tokio::spawn({
        let token = token.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, stopping pipelines");
                token.cancel();
            }
        }
    });

    let broker = KafkaBroker::new(args.broker.bootstrap_servers)?;
    let orchestrator = Orchestrator::new(token).jobs(pipelines(broker, &config));

    orchestrator.run().await
}
