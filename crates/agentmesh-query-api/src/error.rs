//! Error taxonomy for the query API's HTTP surface.
//!
//! Every variant maps to a stable short `error` string in failure
//! responses, plus the status code a client should treat as
//! authoritative.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid query parameters: {0}")]
    InvalidParams(String),

    #[error("unknown entity: {0}")]
    NotFound(String),

    #[error("state store unavailable: {0}")]
    Store(#[from] agentmesh_store::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = match &self {
            Error::InvalidParams(_) => (StatusCode::BAD_REQUEST, "invalid_params"),
            Error::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_unavailable"),
        };
        tracing::warn!(error = %self, code, "query api request failed");
        (status, Json(ErrorBody { error: code.to_string() })).into_response()
    }
}
