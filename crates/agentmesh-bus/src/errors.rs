//! Error types for the message bus client.

use thiserror::Error;

/// Error type for bus operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to create Kafka client: {0}")]
    ClientCreation(String),

    #[error("invalid bus configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to serialize record for stream {stream}: {source}")]
    Serialize {
        stream: String,
        source: serde_json::Error,
    },

    #[error("failed to deserialize record: {0}")]
    Deserialize(String),

    #[error("send to {stream} failed after {attempts} attempts: {reason}")]
    SendFailed {
        stream: String,
        attempts: u32,
        reason: String,
    },
}

/// Result type for bus operations.
pub type Result<T> = std::result::Result<T, Error>;
