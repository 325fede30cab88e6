//! Error types for the state store client.

use thiserror::Error;

/// Error type for state store operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("store connection error: {0}")]
    Connection(String),

    #[error("store command error: {0}")]
    Command(String),

    #[error("failed to serialize value for key {key}: {source}")]
    Serialize {
        key: String,
        source: serde_json::Error,
    },

    #[error("failed to deserialize value for key {key}: {source}")]
    Deserialize {
        key: String,
        source: serde_json::Error,
    },
}

impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
            Error::Connection(err.to_string())
        } else {
            Error::Command(err.to_string())
        }
    }
}

/// Result type for state store operations.
pub type Result<T> = std::result::Result<T, Error>;
