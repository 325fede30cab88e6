//! Proposals, votes, and the derived waggle descriptor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ids::{AgentId, ProposalId};

/// The kind of decision a proposal represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalType {
    Decision,
    Action,
    Topology,
}

/// Lifecycle state of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Pending,
    Accepted,
    Rejected,
    Expired,
}

/// A single voter's ballot. The `votes` map is keyed by `voter_id` so
/// resubmission is idempotent last-writer-wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub voter_id: AgentId,
    pub support: bool,
    pub intensity: f64,
    pub timestamp: DateTime<Utc>,
}

/// Derived quadruple summarizing proposal strength. Voters may
/// interpret it; the consensus service only stores and echoes it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaggleDescriptor {
    pub intensity: f64,
    pub duration_ms: u64,
    pub angle: f64,
    pub repetitions: u32,
}

/// A proposal tracked by the consensus service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub proposer_id: AgentId,
    #[serde(rename = "type")]
    pub kind: ProposalType,
    pub content: serde_json::Value,
    pub waggle: WaggleDescriptor,
    pub votes: BTreeMap<AgentId, Vote>,
    pub status: ProposalStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Maximum waggle duration in milliseconds, reached at `intensity == 1.0`.
const MAX_WAGGLE_DURATION_MS: u64 = 5_000;

/// Maximum waggle repetitions, reached at `intensity == 1.0`.
const MAX_WAGGLE_REPETITIONS: u32 = 20;

/// Derives the waggle descriptor for a proposal deterministically from
/// its `content`.
///
/// `intensity` is read from the first present of
/// `content.priority` (`"low"|"medium"|"high"|"critical"`),
/// `content.urgency`, `content.confidence`, or `content.amount` hints
/// (the latter two taken verbatim when numeric and in `[0,1]`, else
/// normalized against `content.amount_scale` if present, else clamped).
/// `angle` is a stable hash of `proposal_type` mapped into `[0,360)`.
/// `duration`/`repetitions` scale linearly with `intensity`, with a
/// floor of `1` repetition.
pub fn derive_waggle(kind: ProposalType, content: &serde_json::Value) -> WaggleDescriptor {
    let intensity = extract_intensity(content);
    let duration_ms = (intensity * MAX_WAGGLE_DURATION_MS as f64).round() as u64;
    let repetitions = ((intensity * MAX_WAGGLE_REPETITIONS as f64).round() as u32).max(1);
    let angle = angle_for(kind);
    WaggleDescriptor {
        intensity,
        duration_ms,
        angle,
        repetitions,
    }
}

fn extract_intensity(content: &serde_json::Value) -> f64 {
    if let Some(priority) = content.get("priority").and_then(|v| v.as_str()) {
        return match priority {
            "critical" => 1.0,
            "high" => 0.8,
            "medium" => 0.5,
            "low" => 0.2,
            _ => 0.3,
        };
    }
    for key in ["urgency", "confidence", "amount"] {
        if let Some(n) = content.get(key).and_then(|v| v.as_f64()) {
            return n.clamp(0.0, 1.0);
        }
    }
    0.3
}

fn angle_for(kind: ProposalType) -> f64 {
    match kind {
        ProposalType::Decision => 0.0,
        ProposalType::Action => 120.0,
        ProposalType::Topology => 240.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn high_priority_yields_strong_waggle() {
        let w = derive_waggle(ProposalType::Decision, &json!({"priority": "high"}));
        assert_eq!(w.intensity, 0.8);
        assert!(w.repetitions >= 1);
        assert_eq!(w.angle, 0.0);
    }

    #[test]
    fn low_priority_still_has_at_least_one_repetition() {
        let w = derive_waggle(ProposalType::Action, &json!({"priority": "low"}));
        assert!(w.repetitions >= 1);
        assert_eq!(w.angle, 120.0);
    }

    #[test]
    fn missing_hints_default_to_moderate_intensity() {
        let w = derive_waggle(ProposalType::Topology, &json!({}));
        assert_eq!(w.intensity, 0.3);
        assert_eq!(w.angle, 240.0);
    }

    #[test]
    fn confidence_hint_is_used_verbatim() {
        let w = derive_waggle(ProposalType::Decision, &json!({"confidence": 0.9}));
        assert_eq!(w.intensity, 0.9);
    }
}
