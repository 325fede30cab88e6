//! The knowledge aggregator's owned state: the primary insight map
//! plus its three secondary indices.
//!
//! The primary map and the index set are guarded by separate locks,
//! always acquired primary-first, so a caller that genuinely needs a
//! consistent view of both never deadlocks against a caller going the
//! other way.

use std::collections::HashMap;

use agentmesh_types::{AgentId, Insight, InsightId, InsightType};
use parking_lot::RwLock;

const REPEATED_TOPIC_THRESHOLD: usize = 3;

#[derive(Default)]
struct Indices {
    by_topic: HashMap<String, Vec<InsightId>>,
    by_agent: HashMap<AgentId, Vec<InsightId>>,
    by_type: HashMap<InsightType, Vec<InsightId>>,
}

pub struct KnowledgeAggregator {
    primary: RwLock<HashMap<InsightId, Insight>>,
    indices: RwLock<Indices>,
}

impl Default for KnowledgeAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl KnowledgeAggregator {
    pub fn new() -> Self {
        Self {
            primary: RwLock::new(HashMap::new()),
            indices: RwLock::new(Indices::default()),
        }
    }

    /// Inserts `insight` into the primary map and every secondary
    /// index, in insertion order.
    pub fn record(&self, insight: Insight) {
        let id = insight.id.clone();
        let topic = insight.topic.clone();
        let agent_id = insight.agent_id.clone();
        let kind = insight.kind;

        let mut primary = self.primary.write();
        primary.insert(id.clone(), insight);
        drop(primary);

        let mut indices = self.indices.write();
        indices.by_topic.entry(topic).or_default().push(id.clone());
        indices.by_agent.entry(agent_id).or_default().push(id.clone());
        indices.by_type.entry(kind).or_default().push(id);
    }

    /// Bulk-loads insights recovered from the state store on a cold
    /// start. Does not attempt to reconstruct any particular
    /// insertion order across restarts beyond the order `insights` is
    /// given in.
    pub fn bulk_load(&self, insights: Vec<Insight>) {
        for insight in insights {
            self.record(insight);
        }
    }

    /// Every currently-held insight, for the periodic persistence tick.
    pub fn all_insights(&self) -> Vec<Insight> {
        self.primary.read().values().cloned().collect()
    }

    /// Topics whose insight count has reached the repeated-topic
    /// threshold, for the pattern-detection tick.
    pub fn repeated_topics(&self) -> Vec<(String, usize)> {
        self.indices
            .read()
            .by_topic
            .iter()
            .filter(|(_, ids)| ids.len() >= REPEATED_TOPIC_THRESHOLD)
            .map(|(topic, ids)| (topic.clone(), ids.len()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.primary.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn by_agent(&self, agent_id: &str) -> Vec<InsightId> {
        self.indices.read().by_agent.get(agent_id).cloned().unwrap_or_default()
    }

    #[cfg(test)]
    fn by_type(&self, kind: InsightType) -> Vec<InsightId> {
        self.indices.read().by_type.get(&kind).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn insight(id: &str, topic: &str, agent_id: &str) -> Insight {
        Insight {
            id: id.to_string(),
            agent_id: agent_id.to_string(),
            agent_role: "analyst".to_string(),
            kind: InsightType::PricingIssue,
            topic: topic.to_string(),
            content: "content".to_string(),
            data: serde_json::json!({}),
            confidence: 0.8,
            tags: vec![],
            metadata: BTreeMap::new(),
            created_at: Utc::now(),
            privacy: agentmesh_types::PrivacyLevel::Public,
            shared_with: None,
        }
    }

    #[test]
    fn recording_populates_primary_and_indices() {
        let agg = KnowledgeAggregator::new();
        agg.record(insight("i1", "pricing", "a"));
        assert_eq!(agg.len(), 1);
        assert_eq!(agg.all_insights().len(), 1);
    }

    #[test]
    fn topic_seen_three_times_is_reported_as_repeated() {
        let agg = KnowledgeAggregator::new();
        agg.record(insight("i1", "pricing", "a"));
        agg.record(insight("i2", "pricing", "b"));
        assert!(agg.repeated_topics().is_empty());

        agg.record(insight("i3", "pricing", "c"));
        let repeated = agg.repeated_topics();
        assert_eq!(repeated, vec![("pricing".to_string(), 3)]);
    }

    #[test]
    fn bulk_load_restores_all_insights_on_cold_start() {
        let agg = KnowledgeAggregator::new();
        agg.bulk_load(vec![insight("i1", "fraud", "a"), insight("i2", "fraud", "b")]);
        assert_eq!(agg.len(), 2);
        assert_eq!(agg.repeated_topics().len(), 0);
    }

    #[test]
    fn by_agent_index_tracks_insertion_order_per_agent() {
        let agg = KnowledgeAggregator::new();
        agg.record(insight("i1", "pricing", "a"));
        agg.record(insight("i2", "fraud", "b"));
        agg.record(insight("i3", "inventory", "a"));
        assert_eq!(agg.by_agent("a"), vec!["i1".to_string(), "i3".to_string()]);
        assert_eq!(agg.by_agent("b"), vec!["i2".to_string()]);
        assert!(agg.by_agent("ghost").is_empty());
    }

    #[test]
    fn by_type_index_groups_insights_sharing_a_kind() {
        let agg = KnowledgeAggregator::new();
        agg.record(insight("i1", "pricing", "a"));
        agg.record(insight("i2", "fraud", "b"));
        assert_eq!(
            agg.by_type(InsightType::PricingIssue),
            vec!["i1".to_string(), "i2".to_string()]
        );
    }
}
