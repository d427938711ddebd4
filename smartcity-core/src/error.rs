#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("serde_json `{0}`")]
    SerdeJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CodecError>;
