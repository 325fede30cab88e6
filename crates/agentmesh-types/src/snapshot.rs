//! Serializable whole-graph snapshots with derived statistics.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::edge::Edge;
use crate::ids::{AgentId, EdgeId};

/// Derived aggregate statistics over a [`GraphSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_agents: usize,
    pub total_edges: usize,
    pub active_edges: usize,
    pub avg_weight: f64,
    pub max_weight: f64,
    pub min_weight: f64,
    pub density: f64,
    pub reduction_percent: f64,
}

/// A point-in-time immutable deep copy of the graph plus derived stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub agents: BTreeMap<AgentId, Agent>,
    pub edges: BTreeMap<EdgeId, Edge>,
    pub timestamp: DateTime<Utc>,
    pub stats: GraphStats,
}

/// Weight above which an edge counts as "active" for `GraphStats`.
pub const ACTIVE_EDGE_WEIGHT_THRESHOLD: f64 = 0.1;

/// Computes [`GraphStats`] for a given set of agents/edges.
pub fn compute_stats(agents: &BTreeMap<AgentId, Agent>, edges: &BTreeMap<EdgeId, Edge>) -> GraphStats {
    let total_agents = agents.len();
    let total_edges = edges.len();
    let active_edges = edges
        .values()
        .filter(|e| e.weight > ACTIVE_EDGE_WEIGHT_THRESHOLD)
        .count();

    let (sum, max, min) = edges.values().fold((0.0_f64, f64::MIN, f64::MAX), |(s, mx, mn), e| {
        (s + e.weight, mx.max(e.weight), mn.min(e.weight))
    });
    let avg_weight = if total_edges > 0 { sum / total_edges as f64 } else { 0.0 };
    let max_weight = if total_edges > 0 { max } else { 0.0 };
    let min_weight = if total_edges > 0 { min } else { 0.0 };

    let possible_edges = total_agents * total_agents.saturating_sub(1);
    let density = if possible_edges > 0 {
        total_edges as f64 / possible_edges as f64
    } else {
        0.0
    };
    let reduction_percent = 100.0 * (1.0 - density);

    GraphStats {
        total_agents,
        total_edges,
        active_edges,
        avg_weight,
        max_weight,
        min_weight,
        density,
        reduction_percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_graph_has_zeroed_stats() {
        let stats = compute_stats(&BTreeMap::new(), &BTreeMap::new());
        assert_eq!(stats.total_agents, 0);
        assert_eq!(stats.total_edges, 0);
        assert_eq!(stats.density, 0.0);
        assert_eq!(stats.reduction_percent, 100.0);
    }

    #[test]
    fn active_edges_excludes_weight_at_or_below_threshold() {
        let mut agents = BTreeMap::new();
        agents.insert("a".to_string(), Agent::joined("a", "A", "worker"));
        agents.insert("b".to_string(), Agent::joined("b", "B", "worker"));
        let mut edges = BTreeMap::new();
        edges.insert("a->b".to_string(), Edge::new("a", "b", 0.1));
        edges.insert("b->a".to_string(), Edge::new("b", "a", 0.5));
        let stats = compute_stats(&agents, &edges);
        assert_eq!(stats.active_edges, 1);
        assert_eq!(stats.total_edges, 2);
    }
}
