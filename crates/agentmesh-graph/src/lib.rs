//! In-memory directed weighted multigraph modeling agent topology.
//!
//! Edges are reinforced by message traffic, decay on a tick, and are
//! pruned once their weight falls to the floor. A single [`Graph`]
//! owns a `parking_lot::RwLock` over agent membership (readers
//! concurrent, writers exclusive for join/leave) and a [`DashMap`]
//! of edges, whose internal sharding gives fine-grained per-edge
//! locking so concurrent reinforcement of distinct edges never
//! contends on a single global lock.

pub mod error;

use std::collections::HashMap;

use agentmesh_types::{compute_stats, edge_id, Agent, AgentId, Edge, EdgeId, GraphSnapshot};
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::RwLock;

pub use error::{Error, Result};

/// The shared topology graph. Cheap to clone (wraps `Arc`-free
/// interior mutability), so a single instance is held behind an
/// `Arc` by the owning service.
pub struct Graph {
    agents: RwLock<HashMap<AgentId, Agent>>,
    edges: DashMap<EdgeId, Edge>,
    initial_edge_weight: f64,
    reinforcement_amount: f64,
    decay_rate: f64,
}

impl Graph {
    /// Creates an empty graph with the given tuning parameters.
    pub fn new(initial_edge_weight: f64, reinforcement_amount: f64, decay_rate: f64) -> Self {
        Self {
            agents: RwLock::new(HashMap::new()),
            edges: DashMap::new(),
            initial_edge_weight,
            reinforcement_amount,
            decay_rate,
        }
    }

    /// Registers `agent`, wiring it into a full mesh with every agent
    /// already present (including a self-loop) at `initial_edge_weight`.
    ///
    /// Re-joining an already-registered agent id refreshes its record
    /// in place and is a no-op on the edge set.
    pub fn add_agent(&self, agent: Agent) {
        let mut agents = self.agents.write();
        let existing: Vec<AgentId> = agents.keys().cloned().collect();
        let id = agent.id.clone();
        agents.insert(id.clone(), agent);
        drop(agents);

        for other in &existing {
            self.seed_edge(&id, other);
            self.seed_edge(other, &id);
        }
        self.seed_edge(&id, &id);
    }

    fn seed_edge(&self, source: &str, target: &str) {
        self.edges
            .entry(edge_id(source, target))
            .or_insert_with(|| Edge::new(source, target, self.initial_edge_weight));
    }

    /// Removes `agent_id` and every edge incident to it (either
    /// direction, including its self-loop).
    pub fn remove_agent(&self, agent_id: &str) -> Result<()> {
        let mut agents = self.agents.write();
        if agents.remove(agent_id).is_none() {
            return Err(Error::AgentNotFound(agent_id.to_string()));
        }
        drop(agents);

        self.edges
            .retain(|_, edge| edge.source != agent_id && edge.target != agent_id);
        Ok(())
    }

    /// Reinforces the edge `source -> target`, auto-creating it at
    /// `initial_edge_weight` first if both endpoints are registered
    /// agents and the edge does not yet exist.
    pub fn reinforce_edge(&self, source: &str, target: &str) -> Result<()> {
        {
            let agents = self.agents.read();
            if !agents.contains_key(source) {
                return Err(Error::AgentNotFound(source.to_string()));
            }
            if !agents.contains_key(target) {
                return Err(Error::AgentNotFound(target.to_string()));
            }
        }

        let id = edge_id(source, target);
        let amount = self.reinforcement_amount;
        let mut edge = self
            .edges
            .entry(id)
            .or_insert_with(|| Edge::new(source, target, self.initial_edge_weight));
        edge.weight = (edge.weight + amount).clamp(0.0, 1.0);
        edge.usage += 1;
        edge.last_used = Utc::now();
        Ok(())
    }

    /// Decays every edge's weight by `decay_rate`, floored at `0.0`.
    pub fn decay_all(&self) {
        for mut entry in self.edges.iter_mut() {
            let w = entry.weight;
            entry.weight = (w - self.decay_rate).max(0.0);
        }
    }

    /// Removes every edge whose weight has fallen strictly below
    /// `threshold` and returns their ids. An edge sitting exactly at
    /// `threshold` survives as dormant. Self-loops are pruned like any
    /// other edge.
    pub fn prune_weak(&self, threshold: f64) -> Vec<EdgeId> {
        let removed: Vec<EdgeId> = self
            .edges
            .iter()
            .filter(|e| e.weight < threshold)
            .map(|e| e.key().clone())
            .collect();
        for id in &removed {
            self.edges.remove(id);
        }
        removed
    }

    /// The targets of `agent_id`'s outgoing edges with weight at least
    /// `min_weight`, sorted for deterministic iteration.
    pub fn neighbors(&self, agent_id: &str, min_weight: f64) -> Vec<AgentId> {
        let mut out: Vec<AgentId> = self
            .edges
            .iter()
            .filter(|e| e.source == agent_id && e.weight >= min_weight)
            .map(|e| e.target.clone())
            .collect();
        out.sort();
        out
    }

    /// A point-in-time, immutable copy of the full graph plus derived
    /// statistics.
    pub fn snapshot(&self) -> GraphSnapshot {
        let agents: std::collections::BTreeMap<AgentId, Agent> =
            self.agents.read().iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        let edges: std::collections::BTreeMap<EdgeId, Edge> = self
            .edges
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        let stats = compute_stats(&agents, &edges);
        GraphSnapshot {
            agents,
            edges,
            timestamp: Utc::now(),
            stats,
        }
    }

    /// Whether `agent_id` is currently registered.
    pub fn has_agent(&self, agent_id: &str) -> bool {
        self.agents.read().contains_key(agent_id)
    }

    /// The number of currently registered agents.
    pub fn agent_count(&self) -> usize {
        self.agents.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> Graph {
        Graph::new(0.5, 0.1, 0.05)
    }

    fn agent(id: &str) -> Agent {
        Agent::joined(id, id, "worker")
    }

    #[test]
    fn full_mesh_formation_seeds_n_squared_edges_at_initial_weight() {
        let g = graph();
        for id in ["a", "b", "c", "d"] {
            g.add_agent(agent(id));
        }
        let snap = g.snapshot();
        assert_eq!(snap.stats.total_agents, 4);
        assert_eq!(snap.stats.total_edges, 16);
        assert!(snap.edges.values().all(|e| e.weight == 0.5));
    }

    #[test]
    fn late_joiner_links_to_every_existing_agent_and_itself() {
        let g = graph();
        g.add_agent(agent("a"));
        g.add_agent(agent("b"));
        g.add_agent(agent("c"));
        assert_eq!(g.snapshot().stats.total_edges, 9);

        g.add_agent(agent("d"));
        let snap = g.snapshot();
        assert_eq!(snap.stats.total_edges, 16);
        assert!(snap.edges.contains_key("d->a"));
        assert!(snap.edges.contains_key("a->d"));
        assert!(snap.edges.contains_key("d->d"));
    }

    #[test]
    fn reinforce_dominant_path_outweighs_others() {
        let g = graph();
        g.add_agent(agent("a"));
        g.add_agent(agent("b"));
        g.add_agent(agent("c"));

        for _ in 0..5 {
            g.reinforce_edge("a", "b").unwrap();
        }
        let snap = g.snapshot();
        let dominant = snap.edges.get("a->b").unwrap().weight;
        let other = snap.edges.get("a->c").unwrap().weight;
        assert!(dominant > other);
        assert_eq!(dominant, 1.0);
    }

    #[test]
    fn reinforce_unknown_agent_is_rejected() {
        let g = graph();
        g.add_agent(agent("a"));
        assert!(matches!(
            g.reinforce_edge("a", "ghost"),
            Err(Error::AgentNotFound(_))
        ));
    }

    #[test]
    fn reinforce_auto_creates_missing_edge_between_known_agents() {
        let g = Graph::new(0.5, 0.1, 0.05);
        g.add_agent(agent("a"));
        g.add_agent(agent("b"));
        g.prune_weak(1.0);
        assert!(g.neighbors("a", 0.0).is_empty());

        g.reinforce_edge("a", "b").unwrap();
        let snap = g.snapshot();
        assert_eq!(snap.edges.get("a->b").unwrap().weight, 0.6);
    }

    #[test]
    fn decay_reduces_every_edge_weight_with_a_floor_of_zero() {
        let g = graph();
        g.add_agent(agent("a"));
        g.add_agent(agent("b"));
        for _ in 0..20 {
            g.decay_all();
        }
        assert!(g.snapshot().edges.values().all(|e| e.weight == 0.0));
    }

    #[test]
    fn prune_weak_removes_edges_strictly_below_threshold_including_self_loops() {
        let g = graph();
        g.add_agent(agent("a"));
        let removed = g.prune_weak(0.9);
        assert_eq!(removed, vec!["a->a".to_string()]);
        assert!(g.snapshot().edges.is_empty());
    }

    #[test]
    fn prune_weak_keeps_an_edge_sitting_exactly_at_threshold() {
        let g = graph();
        g.add_agent(agent("a"));
        let removed = g.prune_weak(0.5);
        assert!(removed.is_empty());
        assert_eq!(g.snapshot().edges.get("a->a").unwrap().weight, 0.5);
    }

    #[test]
    fn remove_agent_drops_all_incident_edges() {
        let g = graph();
        g.add_agent(agent("a"));
        g.add_agent(agent("b"));
        g.remove_agent("a").unwrap();
        let snap = g.snapshot();
        assert_eq!(snap.stats.total_agents, 1);
        assert!(snap.edges.keys().all(|k| !k.contains('a')));
    }

    #[test]
    fn remove_unknown_agent_errors() {
        let g = graph();
        assert!(matches!(g.remove_agent("ghost"), Err(Error::AgentNotFound(_))));
    }

    #[test]
    fn neighbors_are_sorted_by_target() {
        let g = graph();
        for id in ["c", "a", "b"] {
            g.add_agent(agent(id));
        }
        assert_eq!(g.neighbors("a", 0.0), vec!["a", "b", "c"]);
    }

    #[test]
    fn neighbors_excludes_edges_below_min_weight() {
        let g = graph();
        g.add_agent(agent("a"));
        g.add_agent(agent("b"));
        g.add_agent(agent("c"));
        for _ in 0..5 {
            g.reinforce_edge("a", "b").unwrap();
        }
        assert_eq!(g.neighbors("a", 0.9), vec!["b"]);
    }
}
