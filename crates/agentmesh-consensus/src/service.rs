//! The consensus service's owned state: in-flight proposals and the
//! set of agents currently registered with the topology.
//!
//! Proposals are kept in a [`DashMap`] rather than behind one global
//! lock so that a vote on one proposal never blocks a vote or
//! expiration check on another, the same fine-grained-locking shape
//! `agentmesh-graph` uses for edges.

use agentmesh_types::{
    derive_waggle, AgentId, ConsensusEvent, ConsensusEventType, Proposal, ProposalId,
    ProposalStatus, ProposalSubmission, TopologyRecord, TuningConfig, Vote, VoteRecord,
};
use chrono::Utc;
use dashmap::DashMap;

pub struct ConsensusService {
    proposals: DashMap<ProposalId, Proposal>,
    active_agents: DashMap<AgentId, ()>,
    quorum_threshold: f64,
    proposal_timeout: chrono::Duration,
}

impl ConsensusService {
    pub fn new(config: &TuningConfig) -> Self {
        Self {
            proposals: DashMap::new(),
            active_agents: DashMap::new(),
            quorum_threshold: config.quorum_threshold,
            proposal_timeout: chrono::Duration::from_std(config.proposal_timeout)
                .unwrap_or_else(|_| chrono::Duration::seconds(30)),
        }
    }

    /// Tracks agent membership so quorum can be computed against the
    /// currently registered population.
    pub fn handle_topology_record(&self, record: TopologyRecord) {
        match record {
            TopologyRecord::AgentJoined { agent_id, .. } => {
                self.active_agents.insert(agent_id, ());
            }
            TopologyRecord::AgentLeft { agent_id, .. } => {
                self.active_agents.remove(&agent_id);
            }
        }
    }

    /// Registers a new proposal, deriving its waggle descriptor and
    /// expiry from the submission. Returns the `proposal_created`
    /// event to publish and persist.
    pub fn handle_proposal(&self, submission: ProposalSubmission) -> ConsensusEvent {
        let waggle = derive_waggle(submission.kind, &submission.content);
        let expires_at = submission.created_at + self.proposal_timeout;
        let proposal = Proposal {
            id: submission.id.clone(),
            proposer_id: submission.proposer_id,
            kind: submission.kind,
            content: submission.content,
            waggle,
            votes: Default::default(),
            status: ProposalStatus::Pending,
            created_at: submission.created_at,
            expires_at,
        };
        self.proposals.insert(submission.id.clone(), proposal.clone());
        ConsensusEvent {
            kind: ConsensusEventType::ProposalCreated,
            proposal_id: submission.id,
            proposal,
            timestamp: Utc::now(),
        }
    }

    /// Applies a vote record. A vote against an unknown or
    /// already-resolved proposal is a silent no-op, since votes may
    /// race with expiration or simply target a stale id. Returns the
    /// quorum/acceptance events to publish, if any, and the updated
    /// proposal to persist.
    pub fn handle_vote(&self, vote: VoteRecord) -> Option<(Vec<ConsensusEvent>, Proposal)> {
        let mut entry = self.proposals.get_mut(&vote.proposal_id)?;
        if entry.status != ProposalStatus::Pending {
            return None;
        }

        entry.votes.insert(
            vote.voter_id.clone(),
            Vote {
                voter_id: vote.voter_id,
                support: vote.support,
                intensity: vote.intensity,
                timestamp: vote.timestamp,
            },
        );

        let registered = self.active_agents.len().max(1);
        let supporting = entry.votes.values().filter(|v| v.support).count();
        let ratio = supporting as f64 / registered as f64;

        if ratio < self.quorum_threshold {
            return Some((Vec::new(), entry.clone()));
        }

        entry.status = ProposalStatus::Accepted;
        let proposal = entry.clone();
        let now = Utc::now();
        Some((
            vec![
                ConsensusEvent {
                    kind: ConsensusEventType::QuorumReached,
                    proposal_id: proposal.id.clone(),
                    proposal: proposal.clone(),
                    timestamp: now,
                },
                ConsensusEvent {
                    kind: ConsensusEventType::ProposalAccepted,
                    proposal_id: proposal.id.clone(),
                    proposal: proposal.clone(),
                    timestamp: now,
                },
            ],
            proposal,
        ))
    }

    /// Transitions every pending proposal past its `expires_at` to
    /// `expired`, returning the events/proposals to publish/persist.
    pub fn expire_overdue(&self) -> Vec<(ConsensusEvent, Proposal)> {
        let now = Utc::now();
        let overdue: Vec<ProposalId> = self
            .proposals
            .iter()
            .filter(|e| e.status == ProposalStatus::Pending && e.expires_at < now)
            .map(|e| e.key().clone())
            .collect();

        let mut out = Vec::with_capacity(overdue.len());
        for id in overdue {
            if let Some(mut entry) = self.proposals.get_mut(&id) {
                if entry.status != ProposalStatus::Pending {
                    continue;
                }
                entry.status = ProposalStatus::Expired;
                let proposal = entry.clone();
                out.push((
                    ConsensusEvent {
                        kind: ConsensusEventType::ProposalExpired,
                        proposal_id: proposal.id.clone(),
                        proposal: proposal.clone(),
                        timestamp: now,
                    },
                    proposal,
                ));
            }
        }
        out
    }

    #[cfg(test)]
    pub fn proposal(&self, id: &str) -> Option<Proposal> {
        self.proposals.get(id).map(|e| e.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentmesh_types::{Agent, ProposalType};
    use serde_json::json;

    fn config() -> TuningConfig {
        TuningConfig {
            quorum_threshold: 0.6,
            ..Default::default()
        }
    }

    fn join(id: &str) -> TopologyRecord {
        TopologyRecord::AgentJoined {
            agent_id: id.to_string(),
            agent: Agent::joined(id, id, "worker"),
            timestamp: Utc::now(),
        }
    }

    fn submission(id: &str) -> ProposalSubmission {
        ProposalSubmission {
            id: id.to_string(),
            proposer_id: "a".to_string(),
            kind: ProposalType::Decision,
            content: json!({"priority": "high"}),
            created_at: Utc::now(),
        }
    }

    fn vote(proposal_id: &str, voter: &str, support: bool) -> VoteRecord {
        VoteRecord {
            proposal_id: proposal_id.to_string(),
            voter_id: voter.to_string(),
            support,
            intensity: 0.9,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn quorum_reached_with_four_registered_and_three_supporting_votes() {
        let svc = ConsensusService::new(&config());
        for id in ["a", "b", "c", "d"] {
            svc.handle_topology_record(join(id));
        }
        svc.handle_proposal(submission("p1"));

        assert!(svc.handle_vote(vote("p1", "a", true)).unwrap().0.is_empty());
        assert!(svc.handle_vote(vote("p1", "b", true)).unwrap().0.is_empty());
        let (events, proposal) = svc.handle_vote(vote("p1", "c", true)).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(proposal.status, ProposalStatus::Accepted);

        let events_again = svc.handle_vote(vote("p1", "d", true));
        assert!(events_again.is_none());
    }

    #[test]
    fn vote_on_non_pending_proposal_is_ignored() {
        let svc = ConsensusService::new(&config());
        for id in ["a", "b"] {
            svc.handle_topology_record(join(id));
        }
        svc.handle_proposal(submission("p1"));
        svc.handle_vote(vote("p1", "a", true));
        svc.handle_vote(vote("p1", "b", true));
        assert_eq!(svc.proposal("p1").unwrap().status, ProposalStatus::Accepted);

        assert!(svc.handle_vote(vote("p1", "a", false)).is_none());
        assert_eq!(svc.proposal("p1").unwrap().status, ProposalStatus::Accepted);
    }

    #[test]
    fn zero_vote_proposal_expires_on_a_single_tick_past_timeout() {
        let svc = ConsensusService::new(&TuningConfig {
            proposal_timeout: std::time::Duration::from_secs(0),
            ..Default::default()
        });
        svc.handle_proposal(submission("p1"));
        std::thread::sleep(std::time::Duration::from_millis(5));
        let expired = svc.expire_overdue();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].1.status, ProposalStatus::Expired);
        assert_eq!(svc.proposal("p1").unwrap().status, ProposalStatus::Expired);
    }

    #[test]
    fn reprocessing_a_vote_is_idempotent() {
        let svc = ConsensusService::new(&config());
        svc.handle_topology_record(join("a"));
        svc.handle_topology_record(join("b"));
        svc.handle_proposal(submission("p1"));
        let v = vote("p1", "a", true);
        svc.handle_vote(v.clone());
        let before = svc.proposal("p1").unwrap();
        svc.handle_vote(v);
        let after = svc.proposal("p1").unwrap();
        assert_eq!(before, after);
    }
}
