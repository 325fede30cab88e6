//! Local notification events, best-effort and bounded.
//!
//! The persisted snapshot in the state store is always the ground
//! truth; these events exist only so in-process listeners (tests,
//! future local dashboards) can observe changes without polling the
//! store. A full channel drops the oldest-pending send and logs at
//! debug rather than applying backpressure to the consumer loops.

use agentmesh_types::{AgentId, EdgeId};
use tokio::sync::mpsc;

/// Channel capacity for [`TopologyEvent`] notifications.
pub const EVENT_CHANNEL_CAPACITY: usize = 500;

/// A locally-observable topology change.
#[derive(Debug, Clone, PartialEq)]
pub enum TopologyEvent {
    AgentJoined(AgentId),
    AgentLeft(AgentId),
    EdgeRemoved(EdgeId),
}

/// Sends `event`, dropping it with a debug log if the channel is full.
pub fn emit(tx: &mpsc::Sender<TopologyEvent>, event: TopologyEvent) {
    if let Err(mpsc::error::TrySendError::Full(dropped)) = tx.try_send(event) {
        tracing::debug!(?dropped, "topology event channel full, dropping event");
    }
}
