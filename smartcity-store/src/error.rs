#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("batch {batch_id} could not be replayed: {reason}")]
    ReplayIncomplete { batch_id: u64, reason: String },

    #[error("commit for batch {batch_id} has no matching plan")]
    UnplannedCommit { batch_id: u64 },

    #[error("checkpoint file name `{0}` is not a batch id")]
    InvalidBatchFile(String),

    #[error("segment `{path}` is invalid: {reason}")]
    InvalidSegment { path: String, reason: String },

    #[error("io `{0}`")]
    Io(#[from] std::io::Error),

    #[error("serde_json `{0}`")]
    SerdeJson(#[from] serde_json::Error),

    #[error("smartcity_mq `{0}`")]
    Mq(#[from] smartcity_mq::MqError),

    #[error("{0}")]
    Any(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
