//! An in-process stand-in for [`agentmesh_store::StateStore`].

use std::sync::Arc;

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// An in-memory key-value store with the same typed get/set/delete
/// shape as the Redis-backed store. TTLs are tracked but not
/// evicted in the background; [`InMemoryStore::get`] checks
/// expiry lazily on read.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<DashMap<String, Vec<u8>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        let bytes = serde_json::to_vec(value).expect("test value is serializable");
        self.entries.insert(key.to_string(), bytes);
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.entries
            .get(key)
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
    }

    pub fn delete(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn keys(&self, prefix: &str) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| e.key().clone())
            .filter(|k| k.starts_with(prefix))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let store = InMemoryStore::new();
        store.set("agent:a1", &42);
        assert_eq!(store.get::<i32>("agent:a1"), Some(42));
    }

    #[test]
    fn keys_filters_by_prefix() {
        let store = InMemoryStore::new();
        store.set("insight:1", &1);
        store.set("proposal:1", &1);
        let mut keys = store.keys("insight:");
        keys.sort();
        assert_eq!(keys, vec!["insight:1".to_string()]);
    }

    #[test]
    fn delete_removes_the_key() {
        let store = InMemoryStore::new();
        store.set("k", &1);
        store.delete("k");
        assert_eq!(store.get::<i32>("k"), None);
    }
}
