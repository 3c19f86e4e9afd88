//! Vote records and the tally.
//!
//! A tally never breaks ties on its own. Every proposal holding the maximum
//! count is a leader; more than one leader means the ballot goes to
//! arbitration.

use super::access::AccessControl;
use super::error::{BallotError, BallotResult};
use super::proposals::ProposalRegistry;
use super::types::{Identity, ProposalId};
use super::workflow::{WorkflowStateMachine, WorkflowStatus};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Aggregate computed once per ballot lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyResult {
    /// Highest vote count across all proposals.
    pub max_votes: u64,
    /// Every proposal that reached `max_votes`, in id order.
    pub leaders: BTreeSet<ProposalId>,
}

impl TallyResult {
    /// Compute leaders over every stored proposal.
    pub fn compute(proposals: &ProposalRegistry) -> BallotResult<Self> {
        let max_votes = proposals
            .all()
            .iter()
            .map(|p| p.vote_count)
            .max()
            .ok_or(BallotError::NoProposals)?;

        let leaders = proposals
            .all()
            .iter()
            .filter(|p| p.vote_count == max_votes)
            .map(|p| p.id)
            .collect();

        Ok(Self { max_votes, leaders })
    }

    pub fn is_draw(&self) -> bool {
        self.leaders.len() > 1
    }

    /// The single leader, if the tally was decisive.
    pub fn sole_leader(&self) -> Option<ProposalId> {
        if self.leaders.len() == 1 {
            self.leaders.iter().next().copied()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BallotBox {
    /// voter -> proposal voted for. Presence means `has_voted`.
    votes: BTreeMap<Identity, ProposalId>,
    result: Option<TallyResult>,
}

impl BallotBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_voted(&self, voter: &Identity) -> bool {
        self.votes.contains_key(voter)
    }

    pub fn vote_of(&self, voter: &Identity) -> Option<ProposalId> {
        self.votes.get(voter).copied()
    }

    pub fn votes_cast(&self) -> usize {
        self.votes.len()
    }

    pub fn result(&self) -> Option<&TallyResult> {
        self.result.as_ref()
    }

    /// Record an irrevocable vote.
    pub fn cast_vote(
        &mut self,
        voter: &Identity,
        proposal: ProposalId,
        workflow: &WorkflowStateMachine,
        access: &AccessControl,
        proposals: &mut ProposalRegistry,
    ) -> BallotResult<()> {
        workflow.require(WorkflowStatus::VotingSessionStarted)?;
        access.ensure_voter(voter)?;
        if self.has_voted(voter) {
            return Err(BallotError::AlreadyVoted(voter.clone()));
        }
        if !proposals.contains(proposal) {
            return Err(BallotError::ProposalNotFound(proposal));
        }

        proposals.record_vote(proposal)?;
        self.votes.insert(voter.clone(), proposal);
        Ok(())
    }

    /// Compute and store the tally. Allowed once, after voting has closed.
    pub fn tally(
        &mut self,
        workflow: &WorkflowStateMachine,
        proposals: &ProposalRegistry,
    ) -> BallotResult<TallyResult> {
        workflow.require(WorkflowStatus::VotingSessionEnded)?;

        let result = TallyResult::compute(proposals)?;
        self.result = Some(result.clone());
        Ok(result)
    }

    pub fn clear(&mut self) {
        self.votes.clear();
        self.result = None;
    }
}
