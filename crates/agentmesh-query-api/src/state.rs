//! Shared, read-only application state for the query API.
//!
//! The API holds no in-process copy of the topology or insight index:
//! every request reads the current value straight out of the state
//! store, since nothing is shared across process boundaries except by
//! value on the bus or in the store.

use agentmesh_store::StateStore;

#[derive(Clone)]
pub struct AppState {
    pub store: StateStore,
}
