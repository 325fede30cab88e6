//! Typed Redis-backed state store shared by the AgentMesh services.
//!
//! Every value is stored as JSON under a namespaced key (`graph:`,
//! `proposal:`, `insight:`, `agent:`), optionally with a TTL. This
//! mirrors the connection-manager-plus-pipeline style of the
//! teacher's Redis checkpointer, trimmed to the simpler get/set shape
//! AgentMesh needs instead of the checkpoint/thread hierarchy.

pub mod error;

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

pub use error::{Error, Result};

/// A typed, namespaced handle onto Redis.
#[derive(Clone)]
pub struct StateStore {
    conn: ConnectionManager,
}

impl StateStore {
    /// Connects to Redis at `connection_string` (e.g. `redis://localhost:6379`).
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let client = redis::Client::open(connection_string)
            .map_err(|e| Error::Connection(e.to_string()))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        debug!("connected to state store at {connection_string}");
        Ok(Self { conn })
    }

    /// Stores `value` as JSON under `key`, with no expiry.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let payload = serde_json::to_vec(value).map_err(|source| Error::Serialize {
            key: key.to_string(),
            source,
        })?;
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, payload).await?;
        Ok(())
    }

    /// Stores `value` as JSON under `key`, expiring after `ttl`.
    pub async fn set_with_ttl<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let payload = serde_json::to_vec(value).map_err(|source| Error::Serialize {
            key: key.to_string(),
            source,
        })?;
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, payload, ttl.as_secs().max(1)).await?;
        Ok(())
    }

    /// Fetches and deserializes the value at `key`, or `None` if unset.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.conn.clone();
        let raw: Option<Vec<u8>> = conn.get(key).await?;
        match raw {
            Some(bytes) => {
                let value = serde_json::from_slice(&bytes).map_err(|source| Error::Deserialize {
                    key: key.to_string(),
                    source,
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Deletes `key`, if present.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    /// Returns every key matching `pattern` (e.g. `"insight:*"`).
    ///
    /// Uses `KEYS`, which is fine for the small working sets
    /// AgentMesh stores but should not be used on a large shared
    /// Redis instance under write load.
    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn.keys(pattern).await?;
        Ok(keys)
    }
}

/// Builds the key `graph:snapshot:latest`.
pub fn graph_snapshot_key() -> String {
    "graph:snapshot:latest".to_string()
}

/// Builds a time-keyed historical snapshot key: `graph:snapshot:<unix_millis>`.
pub fn graph_snapshot_history_key(unix_millis: i64) -> String {
    format!("graph:snapshot:{unix_millis}")
}

/// Builds the key `proposal:<id>`.
pub fn proposal_key(id: &str) -> String {
    format!("proposal:{id}")
}

/// Builds the key `insight:<id>`.
pub fn insight_key(id: &str) -> String {
    format!("insight:{id}")
}

/// Builds the key `agent:<id>`.
pub fn agent_key(id: &str) -> String {
    format!("agent:{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaced_keys_match_the_documented_scheme() {
        assert_eq!(graph_snapshot_key(), "graph:snapshot:latest");
        assert_eq!(graph_snapshot_history_key(1_700_000_000_000), "graph:snapshot:1700000000000");
        assert_eq!(proposal_key("p1"), "proposal:p1");
        assert_eq!(insight_key("i1"), "insight:i1");
        assert_eq!(agent_key("a1"), "agent:a1");
    }
}
