//! Insight query filter semantics shared by `GET /api/insights` and
//! `POST /api/insights/search`.
//!
//! A filter dimension with multiple values is a set-membership OR
//! within that dimension; the dimensions themselves combine with AND.
//! `limit` is applied after filtering, never before.

use agentmesh_types::{Insight, InsightType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const DEFAULT_LIMIT: usize = 50;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsightFilter {
    #[serde(default)]
    pub topic: Vec<String>,
    #[serde(default)]
    pub agent_type: Vec<String>,
    #[serde(default)]
    pub insight_types: Vec<InsightType>,
    pub min_confidence: Option<f64>,
    pub time_from: Option<DateTime<Utc>>,
    pub time_to: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl InsightFilter {
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    fn matches(&self, insight: &Insight) -> bool {
        if !self.topic.is_empty() && !self.topic.iter().any(|t| t == &insight.topic) {
            return false;
        }
        if !self.agent_type.is_empty() && !self.agent_type.iter().any(|a| a == &insight.agent_role) {
            return false;
        }
        if !self.insight_types.is_empty() && !self.insight_types.contains(&insight.kind) {
            return false;
        }
        if let Some(min_confidence) = self.min_confidence {
            if insight.confidence < min_confidence {
                return false;
            }
        }
        if let Some(from) = self.time_from {
            if insight.created_at < from {
                return false;
            }
        }
        if let Some(to) = self.time_to {
            if insight.created_at > to {
                return false;
            }
        }
        true
    }

    /// Applies this filter to `insights` (assumed already in the
    /// desired order, typically insertion order) and truncates to
    /// `limit`. An empty result is not an error.
    pub fn apply(&self, insights: Vec<Insight>) -> Vec<Insight> {
        let mut matched: Vec<Insight> = insights.into_iter().filter(|i| self.matches(i)).collect();
        matched.truncate(self.limit());
        matched
    }
}

/// Query-string form of the filter for `GET /api/insights`, which only
/// supports `topic`, `agent_type`, `min_confidence`, and `limit`.
#[derive(Debug, Deserialize)]
pub struct InsightQueryParams {
    #[serde(default)]
    pub topic: Vec<String>,
    #[serde(default)]
    pub agent_type: Vec<String>,
    pub min_confidence: Option<f64>,
    pub limit: Option<usize>,
}

impl From<InsightQueryParams> for InsightFilter {
    fn from(params: InsightQueryParams) -> Self {
        Self {
            topic: params.topic,
            agent_type: params.agent_type,
            min_confidence: params.min_confidence,
            limit: params.limit,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn insight(topic: &str, confidence: f64) -> Insight {
        Insight {
            id: format!("{topic}-{confidence}"),
            agent_id: "a".to_string(),
            agent_role: "analyst".to_string(),
            kind: InsightType::PricingIssue,
            topic: topic.to_string(),
            content: "c".to_string(),
            data: serde_json::json!({}),
            confidence,
            tags: vec![],
            metadata: BTreeMap::new(),
            created_at: Utc::now(),
            privacy: agentmesh_types::PrivacyLevel::Public,
            shared_with: None,
        }
    }

    #[test]
    fn topic_and_min_confidence_combine_with_and() {
        let insights = vec![
            insight("pricing", 0.6),
            insight("pricing", 0.72),
            insight("pricing", 0.85),
            insight("fraud", 0.5),
            insight("fraud", 0.95),
        ];
        let filter = InsightFilter {
            topic: vec!["pricing".to_string()],
            min_confidence: Some(0.7),
            limit: Some(10),
            ..Default::default()
        };
        let result = filter.apply(insights);
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|i| i.topic == "pricing" && i.confidence >= 0.7));
    }

    #[test]
    fn multi_value_topic_is_or_within_dimension() {
        let insights = vec![insight("pricing", 0.9), insight("fraud", 0.9), insight("inventory", 0.9)];
        let filter = InsightFilter {
            topic: vec!["pricing".to_string(), "fraud".to_string()],
            limit: Some(10),
            ..Default::default()
        };
        assert_eq!(filter.apply(insights).len(), 2);
    }

    #[test]
    fn empty_match_returns_empty_not_an_error() {
        let filter = InsightFilter {
            topic: vec!["nonexistent".to_string()],
            limit: Some(10),
            ..Default::default()
        };
        assert!(filter.apply(vec![insight("pricing", 0.9)]).is_empty());
    }

    #[test]
    fn limit_applies_after_filtering() {
        let insights = (0..5).map(|i| insight("pricing", 0.9 - i as f64 * 0.01)).collect();
        let filter = InsightFilter {
            topic: vec!["pricing".to_string()],
            limit: Some(2),
            ..Default::default()
        };
        assert_eq!(filter.apply(insights).len(), 2);
    }
}
