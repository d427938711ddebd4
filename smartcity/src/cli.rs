//! Command-line options shared by the binaries.

use clap::{Args, ValueEnum};
use smartcity_core::{Topic, TopicNames};
use smartcity_sim::Arrival;
use std::path::PathBuf;

use crate::config::StorageLayout;

#[derive(Args, Debug, Clone)]
pub struct BrokerArgs {
    /// Kafka bootstrap servers
    #[arg(long, env = "KAFKA_BOOTSTRAP_SERVERS", default_value = "localhost:9092")]
    pub bootstrap_servers: String,
}

#[derive(Args, Debug, Clone)]
pub struct TopicArgs {
    #[arg(long, env = "VEHICLE_TOPIC", default_value = "vehicle_data")]
    pub vehicle_topic: String,

    #[arg(long, env = "GPS_TOPIC", default_value = "gps_data")]
    pub gps_topic: String,

    #[arg(long, env = "TRAFFIC_TOPIC", default_value = "traffic_data")]
    pub traffic_topic: String,

    #[arg(long, env = "WEATHER_TOPIC", default_value = "weather_data")]
    pub weather_topic: String,
}

impl From<TopicArgs> for TopicNames {
    fn from(args: TopicArgs) -> Self {
        TopicNames::default()
            .with(Topic::Vehicle, args.vehicle_topic)
            .with(Topic::Gps, args.gps_topic)
            .with(Topic::Traffic, args.traffic_topic)
            .with(Topic::Weather, args.weather_topic)
    }
}

#[derive(Args, Debug, Clone)]
pub struct StorageArgs {
    /// Root of the per-topic checkpoint directories
    #[arg(long, env = "SMARTCITY_CHECKPOINT_DIR", default_value = "checkpoints")]
    pub checkpoint_dir: PathBuf,

    /// Root of the per-topic output directories
    #[arg(long, env = "SMARTCITY_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,
}

impl From<StorageArgs> for StorageLayout {
    fn from(args: StorageArgs) -> Self {
        StorageLayout::new(args.checkpoint_dir, args.data_dir)
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalArg {
    /// North-west of the destination on both axes
    Quadrant,
    /// Past the destination along the route
    Projection,
}

impl From<ArrivalArg> for Arrival {
    fn from(arg: ArrivalArg) -> Self {
        match arg {
            ArrivalArg::Quadrant => Arrival::Quadrant,
            ArrivalArg::Projection => Arrival::Projection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        topics: TopicArgs,

        #[command(flatten)]
        storage: StorageArgs,
    }

    #[test]
    fn flags_override_topic_and_storage_defaults() {
        let cli = Cli::parse_from([
            "smartcity",
            "--gps-topic",
            "gps_v2",
            "--data-dir",
            "/tmp/lake",
        ]);

        let topics = TopicNames::from(cli.topics);
        let layout = StorageLayout::from(cli.storage);

        assert_eq!(topics.gps, "gps_v2");
        assert_eq!(topics.vehicle, "vehicle_data");
        assert_eq!(layout.output_dir("gps_v2"), PathBuf::from("/tmp/lake/gps_v2"));
    }
}
