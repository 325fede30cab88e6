//! The common wire envelope and per-stream record shapes.
//!
//! Every record on the bus is JSON; `BusEnvelope<T>` carries a
//! `record_type` tag so a consumer can branch before deserializing
//! the typed `payload`, mirroring the header/payload split of the
//! teacher's `DashStreamMessage` (there: protobuf `Header` + oneof
//! `Message`; here: a JSON tag + generic payload, since AgentMesh
//! records are open-ended structured data rather than a fixed
//! telemetry schema).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::ids::{AgentId, ProposalId};
use crate::proposal::{Proposal, ProposalType};

/// Current wire schema version for [`BusEnvelope`].
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// The common envelope wrapping every record published to the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusEnvelope<T> {
    pub record_type: String,
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub published_at: DateTime<Utc>,
    pub payload: T,
}

fn default_schema_version() -> u32 {
    CURRENT_SCHEMA_VERSION
}

impl<T> BusEnvelope<T> {
    /// Wraps `payload` with `record_type` and the current schema
    /// version, stamped with the current time.
    pub fn wrap(record_type: impl Into<String>, payload: T) -> Self {
        Self {
            record_type: record_type.into(),
            schema_version: CURRENT_SCHEMA_VERSION,
            published_at: Utc::now(),
            payload,
        }
    }
}

/// A join/leave record on `agentmesh.topology`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TopologyRecord {
    AgentJoined {
        agent_id: AgentId,
        agent: Agent,
        timestamp: DateTime<Utc>,
    },
    AgentLeft {
        agent_id: AgentId,
        timestamp: DateTime<Utc>,
    },
}

/// A proposal submission record on `agentmesh.proposals`.
///
/// Agents publish only the fields they author; the consensus
/// service derives `waggle`, `votes`, `status`, and `expires_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalSubmission {
    pub id: ProposalId,
    pub proposer_id: AgentId,
    #[serde(rename = "type")]
    pub kind: ProposalType,
    pub content: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// A vote record on `agentmesh.votes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRecord {
    pub proposal_id: ProposalId,
    pub voter_id: AgentId,
    pub support: bool,
    pub intensity: f64,
    pub timestamp: DateTime<Utc>,
}

/// An event published by the consensus service on `agentmesh.consensus`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusEvent {
    #[serde(rename = "type")]
    pub kind: ConsensusEventType,
    pub proposal_id: ProposalId,
    pub proposal: Proposal,
    pub timestamp: DateTime<Utc>,
}

/// The kind of event published on `agentmesh.consensus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusEventType {
    ProposalCreated,
    QuorumReached,
    ProposalAccepted,
    ProposalRejected,
    ProposalExpired,
}
