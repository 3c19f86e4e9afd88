//! Proposal registry.
//!
//! Descriptions are trimmed before they are checked or stored. Duplicate
//! detection compares the trimmed text exactly, so case is significant.

use super::access::AccessControl;
use super::error::{BallotError, BallotResult};
use super::types::{Identity, Proposal, ProposalId};
use super::workflow::{WorkflowStateMachine, WorkflowStatus};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalRegistry {
    /// Indexed by id; ids are dense from 0.
    proposals: Vec<Proposal>,
    by_description: HashMap<String, ProposalId>,
    cap: usize,
}

impl ProposalRegistry {
    pub fn new(cap: usize) -> Self {
        Self {
            proposals: Vec::new(),
            by_description: HashMap::new(),
            cap,
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    /// Store a new proposal from `voter` and return its id.
    pub fn submit(
        &mut self,
        voter: &Identity,
        description: &str,
        workflow: &WorkflowStateMachine,
        access: &AccessControl,
    ) -> BallotResult<ProposalId> {
        workflow.require(WorkflowStatus::ProposalsRegistrationStarted)?;
        access.ensure_voter(voter)?;

        let description = description.trim();
        if description.is_empty() {
            return Err(BallotError::EmptyProposal);
        }
        if let Some(existing) = self.by_description.get(description) {
            return Err(BallotError::DuplicateProposal(*existing));
        }
        if self.proposals.len() >= self.cap {
            return Err(BallotError::ProposalLimitExceeded(self.cap));
        }

        let id = self.proposals.len() as ProposalId;
        self.proposals.push(Proposal {
            id,
            description: description.to_string(),
            vote_count: 0,
        });
        self.by_description.insert(description.to_string(), id);

        Ok(id)
    }

    pub fn get(&self, id: ProposalId) -> BallotResult<&Proposal> {
        usize::try_from(id)
            .ok()
            .and_then(|index| self.proposals.get(index))
            .ok_or(BallotError::ProposalNotFound(id))
    }

    pub fn contains(&self, id: ProposalId) -> bool {
        self.get(id).is_ok()
    }

    /// All proposals in id order.
    pub fn all(&self) -> &[Proposal] {
        &self.proposals
    }

    /// Add one vote to `id`. Only the ballot box calls this.
    pub(crate) fn record_vote(&mut self, id: ProposalId) -> BallotResult<()> {
        let proposal = usize::try_from(id)
            .ok()
            .and_then(|index| self.proposals.get_mut(index))
            .ok_or(BallotError::ProposalNotFound(id))?;
        proposal.vote_count += 1;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.proposals.clear();
        self.by_description.clear();
    }
}
