use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid distribution version {version:?}: {reason}")]
    InvalidVersion { version: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
