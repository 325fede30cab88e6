//! Topology service binary.
//!
//! Owns the agent graph. Consumes join/leave records from
//! `agentmesh.topology` and message-flow records from
//! `agentmesh.messages`, drives periodic decay/prune and snapshot
//! persistence ticks, and serves `/health` + `/metrics`.

mod events;
mod service;

use std::sync::Arc;
use std::time::Duration;

use agentmesh_bus::{BusConfig, ConsumerConfig, MessageBus};
use agentmesh_observability::ObservabilityConfig;
use agentmesh_store::StateStore;
use agentmesh_types::{Message, StreamNames, TopologyRecord, TuningConfig};
use tokio_util::sync::CancellationToken;

use events::EVENT_CHANNEL_CAPACITY;
use service::TopologyService;

const SHUTDOWN_BUDGET: Duration = Duration::from_secs(10);
const SNAPSHOT_INTERVAL: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let obs_config = ObservabilityConfig::from_env("agentmesh-topology");
    agentmesh_observability::init_tracing(&obs_config)?;

    let tuning = TuningConfig::from_env();
    let streams = StreamNames::from_env();
    let bus = Arc::new(MessageBus::connect(BusConfig::from_env())?);
    let store_url = std::env::var("STATE_STORE_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
    let store = StateStore::connect(&store_url).await?;

    let (events_tx, _events_rx) = tokio::sync::mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let service = Arc::new(TopologyService::new(&tuning, events_tx));

    let cancel = CancellationToken::new();

    let mut tasks = tokio::task::JoinSet::new();

    tasks.spawn({
        let bus = bus.clone();
        let service = service.clone();
        let stream = streams.topology();
        let cancel = cancel.clone();
        async move {
            bus.consume::<TopologyRecord, _, _>(
                &stream,
                ConsumerConfig::new("topology-manager"),
                cancel,
                move |envelope| {
                    let service = service.clone();
                    async move {
                        service.handle_topology_record(envelope.payload);
                        Ok(())
                    }
                },
            )
            .await
            .map_err(anyhow::Error::from)
        }
    });

    tasks.spawn({
        let bus = bus.clone();
        let service = service.clone();
        let stream = streams.messages();
        let cancel = cancel.clone();
        async move {
            bus.consume::<Message, _, _>(
                &stream,
                ConsumerConfig::new("topology-reinforcement"),
                cancel,
                move |envelope| {
                    let service = service.clone();
                    async move {
                        service.handle_message(envelope.payload);
                        Ok(())
                    }
                },
            )
            .await
            .map_err(anyhow::Error::from)
        }
    });

    tasks.spawn({
        let service = service.clone();
        let cancel = cancel.clone();
        let interval = tuning.decay_interval;
        async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return Ok::<(), anyhow::Error>(()),
                    _ = ticker.tick() => service.decay_and_prune(),
                }
            }
        }
    });

    tasks.spawn({
        let service = service.clone();
        let store = store.clone();
        let cancel = cancel.clone();
        async move {
            let mut ticker = tokio::time::interval(SNAPSHOT_INTERVAL);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return Ok::<(), anyhow::Error>(()),
                    _ = ticker.tick() => persist_snapshot(&service, &store).await,
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
            tracing::info!(%addr, "topology service metrics listening");
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
    })
    .await;

    persist_snapshot(&service, &store).await;

    Ok(())
}

async fn persist_snapshot(service: &TopologyService, store: &StateStore) {
    let snapshot = service.graph.snapshot();
    if let Err(e) = store.set(&agentmesh_store::graph_snapshot_key(), &snapshot).await {
        tracing::warn!(error = %e, "failed to persist latest graph snapshot, retrying next tick");
        return;
    }
    let history_key = agentmesh_store::graph_snapshot_history_key(snapshot.timestamp.timestamp_millis());
    if let Err(e) = store
        .set_with_ttl(&history_key, &snapshot, Duration::from_secs(3600))
        .await
    {
        tracing::warn!(error = %e, "failed to persist historical graph snapshot");
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
