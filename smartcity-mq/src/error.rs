use smartcity_core::CodecError;

#[derive(Debug, thiserror::Error)]
pub enum MqError {
    #[error("broker `{0}`")]
    Broker(String),

    #[error("flush failed `{0}`")]
    Flush(String),

    #[error("codec `{0}`")]
    Codec(#[from] CodecError),

    #[cfg(feature = "kafka")]
    #[error("rdkafka `{0}`")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("{0}")]
    Any(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, MqError>;
