//! Flow records consumed to drive edge reinforcement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{edge_id, AgentId, EdgeId};

/// The kind of a flow record on `agentmesh.messages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Task,
    Response,
    Waggle,
    Vote,
    Heartbeat,
    Topology,
    Insight,
}

/// A message flow record. The core never interprets `payload`; it is
/// consumed purely to drive edge reinforcement and live streaming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub from: AgentId,
    pub to: AgentId,
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub payload: serde_json::Value,
    #[serde(default)]
    pub metadata: std::collections::BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub edge_id: Option<EdgeId>,
}

impl Message {
    /// Returns the precomputed `edge_id` if present, else derives it
    /// from `from -> to`.
    pub fn resolved_edge_id(&self) -> EdgeId {
        self.edge_id.clone().unwrap_or_else(|| edge_id(&self.from, &self.to))
    }
}
