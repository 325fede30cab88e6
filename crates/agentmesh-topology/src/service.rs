//! The topology service's owned state: the [`Graph`] plus the tuning
//! knobs and local event sink driven by consumed bus records.

use std::sync::Arc;

use agentmesh_types::{Agent, AgentStatus, Message, TopologyRecord, TuningConfig};
use agentmesh_graph::Graph;
use tokio::sync::mpsc;

use crate::events::{emit, TopologyEvent};

/// Owns the graph and relays join/leave/message records into it,
/// emitting best-effort local events for observers.
pub struct TopologyService {
    pub graph: Arc<Graph>,
    prune_threshold: f64,
    events: mpsc::Sender<TopologyEvent>,
}

impl TopologyService {
    pub fn new(config: &TuningConfig, events: mpsc::Sender<TopologyEvent>) -> Self {
        Self {
            graph: Arc::new(Graph::new(
                config.initial_edge_weight,
                config.reinforcement_amount,
                config.decay_rate,
            )),
            prune_threshold: config.prune_threshold,
            events,
        }
    }

    /// Applies a join/leave record from `agentmesh.topology`.
    pub fn handle_topology_record(&self, record: TopologyRecord) {
        match record {
            TopologyRecord::AgentJoined { agent_id, agent, .. } => {
                self.graph.add_agent(agent);
                emit(&self.events, TopologyEvent::AgentJoined(agent_id));
            }
            TopologyRecord::AgentLeft { agent_id, .. } => {
                match self.graph.remove_agent(&agent_id) {
                    Ok(()) => emit(&self.events, TopologyEvent::AgentLeft(agent_id)),
                    Err(e) => tracing::debug!(agent_id, error = %e, "agent_left for unknown agent"),
                }
            }
        }
    }

    /// Applies a flow record from `agentmesh.messages`. Reinforcing an
    /// edge whose endpoints are not yet known is an expected race, not
    /// an error: joins and messages may arrive out of order.
    pub fn handle_message(&self, message: Message) {
        let edge_id = message.resolved_edge_id();
        if let Err(e) = self.graph.reinforce_edge(&message.from, &message.to) {
            tracing::debug!(edge_id, error = %e, "reinforce skipped, endpoint not yet known");
        }
    }

    /// Runs one decay/prune cycle and emits an `edge_removed` event per
    /// pruned edge.
    pub fn decay_and_prune(&self) {
        self.graph.decay_all();
        for edge_id in self.graph.prune_weak(self.prune_threshold) {
            emit(&self.events, TopologyEvent::EdgeRemoved(edge_id));
        }
    }
}

/// Builds a synthetic liveness-only agent record for services (such as
/// consensus) that only need to know an agent joined/left, not its
/// full descriptive metadata.
pub fn minimal_agent(id: impl Into<String>) -> Agent {
    let id = id.into();
    Agent {
        name: id.clone(),
        role: String::new(),
        status: AgentStatus::Active,
        last_seen_at: chrono::Utc::now(),
        capabilities: Default::default(),
        metadata: Default::default(),
        id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentmesh_types::{Agent as AgentType, MessageType};
    use chrono::Utc;

    fn service() -> (TopologyService, mpsc::Receiver<TopologyEvent>) {
        let (tx, rx) = mpsc::channel(8);
        (TopologyService::new(&TuningConfig::default(), tx), rx)
    }

    fn joined(id: &str) -> TopologyRecord {
        TopologyRecord::AgentJoined {
            agent_id: id.to_string(),
            agent: AgentType::joined(id, id, "worker"),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn agent_joined_adds_to_graph_and_emits_event() {
        let (svc, mut rx) = service();
        svc.handle_topology_record(joined("a"));
        assert!(svc.graph.has_agent("a"));
        assert_eq!(rx.recv().await, Some(TopologyEvent::AgentJoined("a".to_string())));
    }

    #[tokio::test]
    async fn agent_left_for_unknown_agent_is_not_an_error() {
        let (svc, mut rx) = service();
        svc.handle_topology_record(TopologyRecord::AgentLeft {
            agent_id: "ghost".to_string(),
            timestamp: Utc::now(),
        });
        assert!(!svc.graph.has_agent("ghost"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn message_before_join_is_silently_ignored() {
        let (svc, _rx) = service();
        svc.handle_message(Message {
            id: "m1".to_string(),
            from: "a".to_string(),
            to: "b".to_string(),
            kind: MessageType::Task,
            payload: serde_json::json!({}),
            metadata: Default::default(),
            timestamp: Utc::now(),
            edge_id: None,
        });
        assert_eq!(svc.graph.snapshot().stats.total_edges, 0);
    }

    #[tokio::test]
    async fn late_join_then_replayed_message_reinforces_the_edge() {
        let (svc, _rx) = service();
        svc.handle_topology_record(joined("a"));
        svc.handle_topology_record(joined("b"));
        svc.handle_message(Message {
            id: "m1".to_string(),
            from: "a".to_string(),
            to: "b".to_string(),
            kind: MessageType::Task,
            payload: serde_json::json!({}),
            metadata: Default::default(),
            timestamp: Utc::now(),
            edge_id: None,
        });
        let snap = svc.graph.snapshot();
        let edge = snap.edges.get("a->b").unwrap();
        assert!(edge.weight > 0.5);
        assert_eq!(edge.usage, 1);
    }

    #[tokio::test]
    async fn decay_and_prune_emits_removed_events_for_pruned_edges() {
        let (svc, mut rx) = service();
        svc.handle_topology_record(joined("a"));
        for _ in 0..20 {
            svc.decay_and_prune();
        }
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, TopologyEvent::EdgeRemoved(id) if id == "a->a"));
    }
}
