//! Agent identity and liveness.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::AgentId;

/// Liveness state of an agent as tracked by the topology service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Active,
    Idle,
    Busy,
    Offline,
}

/// An agent process participating in the mesh via a stable id.
///
/// `id`, `name`, and `role` are immutable identity; `status` and
/// `last_seen_at` are mutable liveness; `capabilities` and `metadata`
/// are descriptive and may be updated by later join records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub role: String,
    pub status: AgentStatus,
    pub last_seen_at: DateTime<Utc>,
    pub capabilities: BTreeSet<String>,
    pub metadata: BTreeMap<String, String>,
}

impl Agent {
    /// Builds an agent snapshot from a join event, defaulting to `Active`.
    pub fn joined(id: impl Into<AgentId>, name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: role.into(),
            status: AgentStatus::Active,
            last_seen_at: Utc::now(),
            capabilities: BTreeSet::new(),
            metadata: BTreeMap::new(),
        }
    }
}
