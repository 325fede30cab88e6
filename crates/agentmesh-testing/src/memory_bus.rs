//! An in-process stand-in for [`agentmesh_bus::MessageBus`].
//!
//! Each topic is an append-only `Vec` of raw JSON bodies guarded by a
//! `DashMap` entry (`DashMap<String, Arc<TopicData>>`), trimmed to
//! what unit tests need: publish, and drain-from-an-offset for
//! consumer-group-style reads.

use std::sync::Arc;

use agentmesh_types::BusEnvelope;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

#[derive(Default)]
struct Topic {
    records: Mutex<Vec<Vec<u8>>>,
}

/// An in-memory multi-topic bus. Cheap to clone; every clone shares
/// the same underlying topics.
#[derive(Clone, Default)]
pub struct InMemoryBus {
    topics: Arc<DashMap<String, Arc<Topic>>>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn topic(&self, name: &str) -> Arc<Topic> {
        self.topics.entry(name.to_string()).or_default().clone()
    }

    /// Appends `payload` to `stream`, wrapped in a [`BusEnvelope`].
    pub async fn publish<T: Serialize>(&self, stream: &str, record_type: &str, payload: T) {
        let envelope = BusEnvelope::wrap(record_type, payload);
        let body = serde_json::to_vec(&envelope).expect("test payload is serializable");
        self.topic(stream).records.lock().await.push(body);
    }

    /// Returns every record published to `stream` from `offset` onward,
    /// decoded as `BusEnvelope<T>`. Records that fail to decode are
    /// skipped, matching the live bus's drop-and-log behavior.
    pub async fn read_from<T: DeserializeOwned>(&self, stream: &str, offset: usize) -> Vec<BusEnvelope<T>> {
        let topic = self.topic(stream);
        let records = topic.records.lock().await;
        records[offset.min(records.len())..]
            .iter()
            .filter_map(|bytes| serde_json::from_slice(bytes).ok())
            .collect()
    }

    /// The number of records published to `stream` so far.
    pub async fn len(&self, stream: &str) -> usize {
        self.topic(stream).records.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn publish_then_read_from_zero_returns_everything() {
        let bus = InMemoryBus::new();
        bus.publish("agentmesh.insights", "insight", json!({"n": 1})).await;
        bus.publish("agentmesh.insights", "insight", json!({"n": 2})).await;

        let records: Vec<BusEnvelope<serde_json::Value>> = bus.read_from("agentmesh.insights", 0).await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].payload["n"], 2);
    }

    #[tokio::test]
    async fn read_from_an_offset_skips_earlier_records() {
        let bus = InMemoryBus::new();
        bus.publish("s", "t", json!(1)).await;
        bus.publish("s", "t", json!(2)).await;
        bus.publish("s", "t", json!(3)).await;

        let records: Vec<BusEnvelope<i32>> = bus.read_from("s", 1).await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].payload, 2);
    }
}
