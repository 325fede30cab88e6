//! Ambient `/health` and `/metrics` HTTP surface for every AgentMesh binary.

use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use tokio::net::TcpListener;

use crate::error::{Error, Result};
use crate::metrics::export;

/// Builds the shared health/metrics router. Services that also expose
/// their own API merge this in with `Router::merge`.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
}

/// Serves the health/metrics router standalone on `port` until the
/// process is terminated.
pub async fn serve(port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::Metrics(format!("failed to bind {addr}: {e}")))?;
    tracing::info!(%addr, "observability server listening");
    axum::serve(listener, router())
        .await
        .map_err(|e| Error::Metrics(format!("observability server error: {e}")))
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn metrics_handler() -> impl IntoResponse {
    (StatusCode::OK, export())
}
