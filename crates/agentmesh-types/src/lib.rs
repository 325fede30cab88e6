//! Shared data model for the AgentMesh coordination fabric: agents,
//! edges, messages, proposals, insights, snapshots, and the bus wire
//! envelope, plus the environment-driven tuning configuration.

pub mod agent;
pub mod config;
pub mod edge;
pub mod envelope;
pub mod ids;
pub mod insight;
pub mod message;
pub mod proposal;
pub mod snapshot;

pub use agent::{Agent, AgentStatus};
pub use config::{StreamNames, TuningConfig};
pub use edge::Edge;
pub use envelope::{
    BusEnvelope, ConsensusEvent, ConsensusEventType, ProposalSubmission, TopologyRecord,
    VoteRecord, CURRENT_SCHEMA_VERSION,
};
pub use ids::{edge_id, split_edge_id, AgentId, EdgeId, InsightId, MalformedEdgeId, ProposalId};
pub use insight::{Insight, InsightType, PrivacyLevel};
pub use message::{Message, MessageType};
pub use proposal::{derive_waggle, Proposal, ProposalStatus, ProposalType, Vote, WaggleDescriptor};
pub use snapshot::{compute_stats, GraphSnapshot, GraphStats, ACTIVE_EDGE_WEIGHT_THRESHOLD};
