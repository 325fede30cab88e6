//! Consensus service binary.
//!
//! Owns in-flight proposals. Consumes proposal submissions and votes
//! from `agentmesh.proposals`/`agentmesh.votes`, tracks registered
//! agents from `agentmesh.topology` to compute quorum, runs an
//! expiration tick, and publishes consensus events to
//! `agentmesh.consensus`.

mod service;

use std::sync::Arc;
use std::time::Duration;

use agentmesh_bus::{BusConfig, ConsumerConfig, MessageBus};
use agentmesh_observability::ObservabilityConfig;
use agentmesh_store::StateStore;
use agentmesh_types::{ConsensusEvent, ConsensusEventType, Proposal, ProposalSubmission, StreamNames, TopologyRecord, TuningConfig, VoteRecord};
use tokio_util::sync::CancellationToken;

use service::ConsensusService;

const SHUTDOWN_BUDGET: Duration = Duration::from_secs(10);
const EXPIRATION_TICK: Duration = Duration::from_secs(5);
const PROPOSAL_RETENTION_AFTER_EXPIRY: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let obs_config = ObservabilityConfig::from_env("agentmesh-consensus");
    agentmesh_observability::init_tracing(&obs_config)?;

    let tuning = TuningConfig::from_env();
    let streams = StreamNames::from_env();
    let bus = Arc::new(MessageBus::connect(BusConfig::from_env())?);
    let store_url = std::env::var("STATE_STORE_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
    let store = StateStore::connect(&store_url).await?;
    let service = Arc::new(ConsensusService::new(&tuning));
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
                ConsumerConfig::new("consensus-agents"),
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
        let store = store.clone();
        let streams = streams.clone();
        let stream = streams.proposals();
        let cancel = cancel.clone();
        async move {
            bus.consume::<ProposalSubmission, _, _>(
                &stream,
                ConsumerConfig::new("consensus-manager"),
                cancel,
                move |envelope| {
                    let service = service.clone();
                    let bus = bus.clone();
                    let store = store.clone();
                    let consensus_stream = streams.consensus();
                    async move {
                        let event = service.handle_proposal(envelope.payload);
                        persist_proposal(&store, &event.proposal).await;
                        publish_event(&bus, &consensus_stream, &event).await;
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
        let store = store.clone();
        let streams = streams.clone();
        let stream = streams.votes();
        let cancel = cancel.clone();
        async move {
            bus.consume::<VoteRecord, _, _>(
                &stream,
                ConsumerConfig::new("consensus-manager"),
                cancel,
                move |envelope| {
                    let service = service.clone();
                    let bus = bus.clone();
                    let store = store.clone();
                    let consensus_stream = streams.consensus();
                    async move {
                        if let Some((events, proposal)) = service.handle_vote(envelope.payload) {
                            persist_proposal(&store, &proposal).await;
                            for event in &events {
                                publish_event(&bus, &consensus_stream, event).await;
                            }
                        }
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
        let store = store.clone();
        let consensus_stream = streams.consensus();
        let cancel = cancel.clone();
        async move {
            let mut ticker = tokio::time::interval(EXPIRATION_TICK);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return Ok::<(), anyhow::Error>(()),
                    _ = ticker.tick() => {
                        for (event, proposal) in service.expire_overdue() {
                            persist_proposal(&store, &proposal).await;
                            publish_event(&bus, &consensus_stream, &event).await;
                        }
                    }
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
            tracing::info!(%addr, "consensus service metrics listening");
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

    Ok(())
}

async fn persist_proposal(store: &StateStore, proposal: &Proposal) {
    let ttl = (proposal.expires_at - chrono::Utc::now())
        .to_std()
        .unwrap_or(Duration::ZERO)
        + PROPOSAL_RETENTION_AFTER_EXPIRY;
    if let Err(e) = store
        .set_with_ttl(&agentmesh_store::proposal_key(&proposal.id), proposal, ttl)
        .await
    {
        tracing::warn!(proposal_id = %proposal.id, error = %e, "failed to persist proposal");
    }
}

async fn publish_event(bus: &MessageBus, stream: &str, event: &ConsensusEvent) {
    let record_type = match event.kind {
        ConsensusEventType::ProposalCreated => "proposal_created",
        ConsensusEventType::QuorumReached => "quorum_reached",
        ConsensusEventType::ProposalAccepted => "proposal_accepted",
        ConsensusEventType::ProposalRejected => "proposal_rejected",
        ConsensusEventType::ProposalExpired => "proposal_expired",
    };
    if let Err(e) = bus.publish(stream, &event.proposal_id, record_type, event).await {
        tracing::warn!(proposal_id = %event.proposal_id, record_type, error = %e, "failed to publish consensus event");
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
