//! Directed weighted edges between agents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{edge_id, AgentId, EdgeId};

/// A directed, weighted edge from `source` to `target`.
///
/// Invariants enforced by the [`crate::Graph`] contract that owns
/// these: `weight` stays in `[0.0, 1.0]`, `usage` is monotone
/// non-decreasing, and at most one edge exists per ordered pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: AgentId,
    pub target: AgentId,
    pub weight: f64,
    pub usage: u64,
    pub created_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
}

impl Edge {
    /// Creates a new edge at `weight`, with `usage = 0` and both
    /// timestamps set to now.
    pub fn new(source: impl Into<AgentId>, target: impl Into<AgentId>, weight: f64) -> Self {
        let now = Utc::now();
        Self {
            source: source.into(),
            target: target.into(),
            weight: weight.clamp(0.0, 1.0),
            usage: 0,
            created_at: now,
            last_used: now,
        }
    }

    /// The deterministic id for this edge: `"<source>-><target>"`.
    pub fn id(&self) -> EdgeId {
        edge_id(&self.source, &self.target)
    }
}
