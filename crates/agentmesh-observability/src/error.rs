//! Error types for observability initialization and serving.

use thiserror::Error;

/// Error type for observability operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to install tracing subscriber: {0}")]
    Tracing(String),

    #[error("metrics operation failed: {0}")]
    Metrics(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type for observability operations.
pub type Result<T> = std::result::Result<T, Error>;
