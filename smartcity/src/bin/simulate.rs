//! Publishes the telemetry of one simulated journey to Kafka.
//!
//! ```text
//! KAFKA_BOOTSTRAP_SERVERS=localhost:9092 cargo run --features kafka --bin smartcity-simulate
//! ```

use clap::Parser;
use smartcity::{
    cli::{ArrivalArg, BrokerArgs, TopicArgs},
    init_tracing, CancellationToken, Journey, ProducerConfig,
};
use smartcity_mq::KafkaBroker;
use smartcity_sim::SimulatorConfig;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "smartcity-simulate")]
#[command(about = "Simulate a vehicle journey and publish its telemetry")]
struct Args {
    #[command(flatten)]
    broker: BrokerArgs,

    #[command(flatten)]
    topics: TopicArgs,

    /// Seed of the journey and of the generated records
    #[arg(long, env = "SMARTCITY_SEED", default_value_t = 42)]
    seed: u64,

    #[arg(long, default_value = "vehicle-car-1")]
    device_id: String,

    /// Seconds between two ticks
    #[arg(long, default_value_t = 5)]
    interval: u64,

    /// Stop after this many seconds
    #[arg(long)]
    deadline: Option<u64>,

    #[arg(long, value_enum, default_value_t = ArrivalArg::Quadrant)]
    arrival: ArrivalArg,

    #[arg(long, default_value_t = 1000)]
    max_ticks: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let args = Args::parse();
    let token = CancellationToken::new();

    let config = ProducerConfig {
        device_id: args.device_id,
        seed: args.seed,
        tick_interval: Duration::from_secs(args.interval),
        deadline: args.deadline.map(Duration::from_secs),
        simulator: SimulatorConfig {
            arrival: args.arrival.into(),
            max_ticks: args.max_ticks,
            ..Default::default()
        },
        topics: args.topics.into(),
        ..Default::default()
    };

    let scheduler = config.scheduler(token.clone());

    tokio::spawn({
        let token = token.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, stopping");
                token.cancel();
            }
        }
    });

    let broker = KafkaBroker::new(args.broker.bootstrap_servers)?;
    match Journey::new(config, broker, scheduler).run().await {
        Ok(outcome) => {
            tracing::info!(?outcome, "simulation ended");
            Ok(())
        }
        Err(e) => {
            tracing::error!("simulation failed: {e:#}");
            Err(e)
        }
    }
}
