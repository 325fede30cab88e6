//! Error types for the topology graph engine.

use agentmesh_types::AgentId;
use thiserror::Error;

/// Error type for graph operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    /// Both endpoints of a reinforce/neighbors call must already be
    /// registered agents.
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),
}

/// Result type for graph operations.
pub type Result<T> = std::result::Result<T, Error>;
