//! Insights produced by agents and indexed by the knowledge aggregator.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{AgentId, InsightId};

/// The closed set of insight types the aggregator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    CustomerFeedback,
    PricingIssue,
    ProductIssue,
    ProcessImprovement,
    FraudPattern,
    InventoryTrend,
    BehaviorPattern,
    Correlation,
    Anomaly,
}

/// Who may read a restricted insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivacyLevel {
    Public,
    Restricted,
    Private,
}

/// An append-only insight record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub id: InsightId,
    pub agent_id: AgentId,
    pub agent_role: String,
    #[serde(rename = "type")]
    pub kind: InsightType,
    pub topic: String,
    pub content: String,
    pub data: serde_json::Value,
    pub confidence: f64,
    pub tags: Vec<String>,
    pub metadata: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub privacy: PrivacyLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_with: Option<BTreeSet<AgentId>>,
}

impl Insight {
    /// Whether `reader` is permitted to see this insight, per the
    /// consumer-side privacy filter described in the glossary.
    pub fn visible_to(&self, reader: &str) -> bool {
        match self.privacy {
            PrivacyLevel::Public => true,
            PrivacyLevel::Private => self.agent_id == reader,
            PrivacyLevel::Restricted => {
                self.agent_id == reader
                    || self
                        .shared_with
                        .as_ref()
                        .is_some_and(|set| set.contains(reader))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn insight(privacy: PrivacyLevel, shared_with: Option<BTreeSet<AgentId>>) -> Insight {
        Insight {
            id: "i1".into(),
            agent_id: "owner".into(),
            agent_role: "analyst".into(),
            kind: InsightType::Anomaly,
            topic: "t".into(),
            content: "c".into(),
            data: serde_json::json!({}),
            confidence: 0.5,
            tags: vec![],
            metadata: BTreeMap::new(),
            created_at: Utc::now(),
            privacy,
            shared_with,
        }
    }

    #[test]
    fn public_is_visible_to_anyone() {
        assert!(insight(PrivacyLevel::Public, None).visible_to("anyone"));
    }

    #[test]
    fn private_is_visible_only_to_owner() {
        let i = insight(PrivacyLevel::Private, None);
        assert!(i.visible_to("owner"));
        assert!(!i.visible_to("someone-else"));
    }

    #[test]
    fn restricted_is_visible_to_shared_set_and_owner() {
        let mut shared = BTreeSet::new();
        shared.insert("friend".to_string());
        let i = insight(PrivacyLevel::Restricted, Some(shared));
        assert!(i.visible_to("owner"));
        assert!(i.visible_to("friend"));
        assert!(!i.visible_to("stranger"));
    }
}
