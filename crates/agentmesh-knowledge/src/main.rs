//! Knowledge aggregator binary.
//!
//! Owns the insight map and its topic/agent/type indices. Consumes
//! `agentmesh.insights`, persists every insight on a 30s tick, reports
//! repeated topics on a 60s tick, and bulk-loads from the state store
//! on startup so a restart is not a cold loss of knowledge.

mod service;

use std::sync::Arc;
use std::time::Duration;

use agentmesh_bus::{BusConfig, ConsumerConfig, MessageBus};
use agentmesh_observability::ObservabilityConfig;
use agentmesh_store::StateStore;
use agentmesh_types::{Insight, StreamNames};
use tokio_util::sync::CancellationToken;

use service::KnowledgeAggregator;

const SHUTDOWN_BUDGET: Duration = Duration::from_secs(10);
const PATTERN_DETECTION_TICK: Duration = Duration::from_secs(60);
const PERSISTENCE_TICK: Duration = Duration::from_secs(30);
const INSIGHT_TTL: Duration = Duration::from_secs(7 * 24 * 3600);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let obs_config = ObservabilityConfig::from_env("agentmesh-knowledge");
    agentmesh_observability::init_tracing(&obs_config)?;

    let streams = StreamNames::from_env();
    let bus = Arc::new(MessageBus::connect(BusConfig::from_env())?);
    let store_url = std::env::var("STATE_STORE_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
    let store = StateStore::connect(&store_url).await?;
    let aggregator = Arc::new(KnowledgeAggregator::new());

    load_from_store(&aggregator, &store).await;

    let cancel = CancellationToken::new();
    let mut tasks = tokio::task::JoinSet::new();

    tasks.spawn({
        let bus = bus.clone();
        let aggregator = aggregator.clone();
        let stream = streams.insights();
        let cancel = cancel.clone();
        async move {
            bus.consume::<Insight, _, _>(
                &stream,
                ConsumerConfig::new("knowledge-manager"),
                cancel,
                move |envelope| {
                    let aggregator = aggregator.clone();
                    async move {
                        aggregator.record(envelope.payload);
                        Ok(())
                    }
                },
            )
            .await
            .map_err(anyhow::Error::from)
        }
    });

    tasks.spawn({
        let aggregator = aggregator.clone();
        let cancel = cancel.clone();
        async move {
            let mut ticker = tokio::time::interval(PATTERN_DETECTION_TICK);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return Ok::<(), anyhow::Error>(()),
                    _ = ticker.tick() => {
                        for (topic, count) in aggregator.repeated_topics() {
                            tracing::info!(pattern = "repeated_topic", topic, count, "repeated topic detected");
                        }
                    }
                }
            }
        }
    });

    tasks.spawn({
        let aggregator = aggregator.clone();
        let store = store.clone();
        let cancel = cancel.clone();
        async move {
            let mut ticker = tokio::time::interval(PERSISTENCE_TICK);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return Ok::<(), anyhow::Error>(()),
                    _ = ticker.tick() => persist_all(&aggregator, &store).await,
                }
            }
        }
    });

    tasks.spawn({
        let cancel = cancel.clone();
        async move {
            let router = agentmesh_observability::metrics_server::router();
            let addr = format!("0.0.0.0:{}", obs_config.metrics_port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!(%addr, "knowledge service metrics listening");
            axum::serve(listener, router)
                .with_graceful_shutdown(async move { cancel.cancelled().await })
                .await?;
            Ok::<(), anyhow::Error>(())
        }
    });

    shutdown_signal().await;
    tracing::info!("shutdown signal received, cancelling workers");
    cancel.cancel();

    let _ = tokio::time::timeout(SHUTDOWN_BUDGET, async {
        while tasks.join_next().await.is_some() {}
        // final persistence pass before exit
    })
    .await;
    persist_all(&aggregator, &store).await;

    Ok(())
}

async fn load_from_store(aggregator: &KnowledgeAggregator, store: &StateStore) {
    let keys = match store.keys("insight:*").await {
        Ok(keys) => keys,
        Err(e) => {
            tracing::warn!(error = %e, "failed to list persisted insights, starting cold");
            return;
        }
    };
    let mut loaded = Vec::with_capacity(keys.len());
    for key in keys {
        match store.get::<Insight>(&key).await {
            Ok(Some(insight)) => loaded.push(insight),
            Ok(None) => {}
            Err(e) => tracing::debug!(key, error = %e, "skipping unloadable insight record"),
        }
    }
    let count = loaded.len();
    aggregator.bulk_load(loaded);
    tracing::info!(count, "restored insights from state store");
}

async fn persist_all(aggregator: &KnowledgeAggregator, store: &StateStore) {
    for insight in aggregator.all_insights() {
        if let Err(e) = store
            .set_with_ttl(&agentmesh_store::insight_key(&insight.id), &insight, INSIGHT_TTL)
            .await
        {
            tracing::warn!(insight_id = %insight.id, error = %e, "failed to persist insight");
        }
    }
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
