//! Query API binary.
//!
//! A stateless, read-only HTTP surface over the state store. Holds no
//! Graph, proposal map, or insight index of its own — every request
//! reads the current persisted value directly, matching the
//! no-shared-memory-across-processes design of the fabric.

mod error;
mod filters;
mod routes;
mod state;

use std::time::Duration;

use agentmesh_observability::ObservabilityConfig;
use agentmesh_store::StateStore;
use agentmesh_types::config::parse_env_var_with_warning;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use state::AppState;

const DEFAULT_PORT: u16 = 8080;
const SHUTDOWN_BUDGET: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let obs_config = ObservabilityConfig::from_env("agentmesh-query-api");
    agentmesh_observability::init_tracing(&obs_config)?;

    let store_url = std::env::var("STATE_STORE_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
    let store = StateStore::connect(&store_url).await?;
    let port = parse_env_var_with_warning("QUERY_API_PORT", DEFAULT_PORT);

    let app = routes::router(AppState { store })
        .merge(agentmesh_observability::metrics_server::router())
        .layer(CorsLayer::permissive());

    let cancel = CancellationToken::new();
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "query api listening");

    let server = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { cancel.cancelled().await })
                .await
        }
    });

    shutdown_signal().await;
    tracing::info!("shutdown signal received, stopping http server");
    cancel.cancel();
    let _ = tokio::time::timeout(SHUTDOWN_BUDGET, server).await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl_c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
