//! Single-question ballot engine.
//!
//! [`Ballot`] is the context object every operation goes through. It owns
//! the components and makes each command atomic: all validation runs before
//! any state changes, and notifications are appended to the log only after
//! the change is committed.
//!
//! Components, leaf first:
//! - [`access::AccessControl`] - administrator and voter allow-list
//! - [`proposals::ProposalRegistry`] - de-duplicated, capped proposals
//! - [`workflow::WorkflowStateMachine`] - ordered phases guarding everything
//! - [`ballot_box::BallotBox`] - one vote per voter, tally
//! - [`arbitration::ArbitrationResolver`] - administrator tie-break

pub mod access;
pub mod arbitration;
pub mod ballot_box;
pub mod error;
pub mod events;
pub mod handle;
pub mod policy;
pub mod proposals;
pub mod types;
pub mod workflow;

#[cfg(test)]
mod proptests;

pub use access::AccessControl;
pub use arbitration::ArbitrationResolver;
pub use ballot_box::{BallotBox, TallyResult};
pub use error::{BallotError, BallotResult};
pub use events::{BallotEvent, EventLog, EventRecord, EventStream, EventStreamError};
pub use handle::{BallotHandle, WeakBallotHandle};
pub use policy::{BallotPolicy, PolicyError, ProposalVisibility};
pub use proposals::ProposalRegistry;
pub use types::{BallotId, Identity, Proposal, ProposalId, VoterStatus};
pub use workflow::{Transition, WorkflowStateMachine, WorkflowStatus};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// What a tally produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TallyOutcome {
    /// One proposal leads; the ballot is decided.
    Winner(ProposalId),
    /// Several proposals share the lead; `resolve_tie` must pick one.
    Draw(BTreeSet<ProposalId>),
}

/// Self-contained copy of the committed state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotSnapshot {
    pub ballot: BallotId,
    pub question: String,
    pub administrator: Identity,
    pub phase: WorkflowStatus,
    pub voters: Vec<VoterStatus>,
    pub proposals: Vec<Proposal>,
    pub tally: Option<TallyResult>,
    pub winner: Option<ProposalId>,
    /// Sequence the next notification will get.
    pub next_sequence: u64,
}

#[derive(Debug, Clone)]
pub struct Ballot {
    id: BallotId,
    question: String,
    policy: BallotPolicy,
    access: AccessControl,
    workflow: WorkflowStateMachine,
    proposals: ProposalRegistry,
    ballot_box: BallotBox,
    arbitration: ArbitrationResolver,
    log: EventLog,
}

impl Ballot {
    /// Create a ballot in `RegisteringVoters` with an empty allow-list.
    pub fn new(
        administrator: Identity,
        question: impl Into<String>,
        policy: BallotPolicy,
    ) -> Result<Self, PolicyError> {
        Self::with_channel_capacity(
            administrator,
            question,
            policy,
            events::DEFAULT_CHANNEL_CAPACITY,
        )
    }

    pub fn with_channel_capacity(
        administrator: Identity,
        question: impl Into<String>,
        policy: BallotPolicy,
        channel_capacity: usize,
    ) -> Result<Self, PolicyError> {
        policy.validate()?;

        let ballot = Self {
            id: BallotId::generate(),
            question: question.into().trim().to_string(),
            policy,
            access: AccessControl::new(administrator),
            workflow: WorkflowStateMachine::new(),
            proposals: ProposalRegistry::new(policy.proposal_cap),
            ballot_box: BallotBox::new(),
            arbitration: ArbitrationResolver::new(),
            log: EventLog::new(channel_capacity),
        };
        info!(
            ballot = %ballot.id,
            administrator = %ballot.access.administrator(),
            "ballot created"
        );
        Ok(ballot)
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    pub fn register_voter(&mut self, caller: &Identity, voter: Identity) -> BallotResult<()> {
        self.access
            .register(caller, voter.clone(), &self.workflow)
            .inspect_err(|e| self.rejected(caller, "register_voter", e))?;

        debug!(ballot = %self.id, voter = %voter, "voter registered");
        self.emit(BallotEvent::VoterRegistered { voter });
        Ok(())
    }

    pub fn unregister_voter(&mut self, caller: &Identity, voter: &Identity) -> BallotResult<()> {
        self.access
            .unregister(caller, voter, &self.workflow)
            .inspect_err(|e| self.rejected(caller, "unregister_voter", e))?;

        debug!(ballot = %self.id, voter = %voter, "voter unregistered");
        self.emit(BallotEvent::VoterUnregistered {
            voter: voter.clone(),
        });
        Ok(())
    }

    pub fn transfer_administrator(
        &mut self,
        caller: &Identity,
        new_administrator: Identity,
    ) -> BallotResult<()> {
        let previous = self
            .access
            .transfer_administrator(caller, new_administrator.clone())
            .inspect_err(|e| self.rejected(caller, "transfer_administrator", e))?;

        info!(
            ballot = %self.id,
            previous = %previous,
            new = %new_administrator,
            "administrator transferred"
        );
        self.emit(BallotEvent::AdministratorTransferred {
            previous,
            new: new_administrator,
        });
        Ok(())
    }

    /// Replace the ballot question. Only while registering voters.
    pub fn set_question(&mut self, caller: &Identity, question: &str) -> BallotResult<()> {
        self.access
            .ensure_administrator(caller)
            .inspect_err(|e| self.rejected(caller, "set_question", e))?;
        self.workflow.require(WorkflowStatus::RegisteringVoters)?;

        let question = question.trim();
        if question.is_empty() {
            return Err(BallotError::EmptyQuestion);
        }

        self.question = question.to_string();
        debug!(ballot = %self.id, "question set");
        self.emit(BallotEvent::QuestionSet {
            question: self.question.clone(),
        });
        Ok(())
    }

    /// Move to the next administrator-driven phase.
    pub fn advance_phase(&mut self, caller: &Identity) -> BallotResult<Transition> {
        self.access
            .ensure_administrator(caller)
            .inspect_err(|e| self.rejected(caller, "advance_phase", e))?;

        let transition = self.workflow.advance(self.proposals.len())?;
        self.phase_changed(transition);
        Ok(transition)
    }

    /// Move to `target`, which must be the next administrator-driven phase.
    pub fn advance_to(
        &mut self,
        caller: &Identity,
        target: WorkflowStatus,
    ) -> BallotResult<Transition> {
        self.access
            .ensure_administrator(caller)
            .inspect_err(|e| self.rejected(caller, "advance_to", e))?;

        let transition = self.workflow.advance_to(target, self.proposals.len())?;
        self.phase_changed(transition);
        Ok(transition)
    }

    /// Start a new lifecycle: clear voters, proposals, votes and results.
    ///
    /// The administrator, the question and the notification log are kept.
    pub fn reset_ballot(&mut self, caller: &Identity) -> BallotResult<Transition> {
        self.access
            .ensure_administrator(caller)
            .inspect_err(|e| self.rejected(caller, "reset_ballot", e))?;

        self.access.clear();
        self.proposals.clear();
        self.ballot_box.clear();
        self.arbitration.clear();
        let transition = self.workflow.reset();

        let previous_id = self.id;
        self.id = BallotId::generate();
        info!(previous = %previous_id, ballot = %self.id, "ballot reset");

        self.phase_changed(transition);
        Ok(transition)
    }

    pub fn submit_proposal(
        &mut self,
        voter: &Identity,
        description: &str,
    ) -> BallotResult<ProposalId> {
        let proposal_id =
            self.proposals
                .submit(voter, description, &self.workflow, &self.access)?;

        let description = self.proposals.get(proposal_id)?.description.clone();
        debug!(ballot = %self.id, voter = %voter, proposal_id, "proposal registered");
        self.emit(BallotEvent::ProposalRegistered {
            proposal_id,
            description,
        });
        Ok(proposal_id)
    }

    pub fn cast_vote(&mut self, voter: &Identity, proposal_id: ProposalId) -> BallotResult<()> {
        self.ballot_box.cast_vote(
            voter,
            proposal_id,
            &self.workflow,
            &self.access,
            &mut self.proposals,
        )?;

        debug!(ballot = %self.id, voter = %voter, proposal_id, "vote cast");
        self.emit(BallotEvent::Voted {
            voter: voter.clone(),
            proposal_id,
        });
        Ok(())
    }

    /// Count the votes.
    ///
    /// A single leader decides the ballot and moves it to `VotesTallied`.
    /// Several leaders move it to `ArbitrationPending` and emit `Draw`.
    pub fn tally(&mut self, caller: &Identity) -> BallotResult<TallyOutcome> {
        self.access
            .ensure_administrator(caller)
            .inspect_err(|e| self.rejected(caller, "tally", e))?;

        let result = self.ballot_box.tally(&self.workflow, &self.proposals)?;

        match result.sole_leader() {
            Some(winner) => {
                let transition = self.workflow.conclude()?;
                info!(
                    ballot = %self.id,
                    winner,
                    votes = result.max_votes,
                    "votes tallied"
                );
                self.phase_changed(transition);
                Ok(TallyOutcome::Winner(winner))
            }
            None => {
                self.workflow.open_arbitration()?;
                info!(
                    ballot = %self.id,
                    tied = ?result.leaders,
                    votes = result.max_votes,
                    "tally ended in a draw, arbitration required"
                );
                self.emit(BallotEvent::Draw {
                    tied: result.leaders.clone(),
                });
                Ok(TallyOutcome::Draw(result.leaders))
            }
        }
    }

    /// Pick the winner among the tied proposals.
    pub fn resolve_tie(&mut self, caller: &Identity, proposal_id: ProposalId) -> BallotResult<()> {
        self.access
            .ensure_administrator(caller)
            .inspect_err(|e| self.rejected(caller, "resolve_tie", e))?;

        self.arbitration
            .resolve(proposal_id, &self.workflow, self.ballot_box.result())?;
        let transition = self.workflow.conclude()?;

        info!(ballot = %self.id, winner = proposal_id, "tie resolved by arbitration");
        self.phase_changed(transition);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn id(&self) -> BallotId {
        self.id
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn policy(&self) -> &BallotPolicy {
        &self.policy
    }

    pub fn administrator(&self) -> &Identity {
        self.access.administrator()
    }

    pub fn current_phase(&self) -> WorkflowStatus {
        self.workflow.status()
    }

    pub fn proposal(&self, caller: &Identity, id: ProposalId) -> BallotResult<&Proposal> {
        self.ensure_can_read(caller)?;
        self.proposals.get(id)
    }

    /// Every proposal in id order. Bounded by the proposal cap.
    pub fn all_proposals(&self, caller: &Identity) -> BallotResult<&[Proposal]> {
        self.ensure_can_read(caller)?;
        Ok(self.proposals.all())
    }

    pub fn voter_status(&self, caller: &Identity, voter: &Identity) -> BallotResult<VoterStatus> {
        self.ensure_can_read(caller)?;
        Ok(self.status_of(voter))
    }

    pub fn is_registered(&self, voter: &Identity) -> bool {
        self.access.is_voter(voter)
    }

    /// The decided winner, once the ballot reached `VotesTallied`.
    pub fn winning_proposal_id(&self) -> Option<ProposalId> {
        if !self.workflow.status().is_terminal() {
            return None;
        }
        self.ballot_box
            .result()
            .and_then(TallyResult::sole_leader)
            .or_else(|| self.arbitration.decision())
    }

    pub fn winning_proposal_description(&self) -> Option<&str> {
        let id = self.winning_proposal_id()?;
        self.proposals.get(id).ok().map(|p| p.description.as_str())
    }

    /// Leaders of the tally: one after a decisive tally, several after a draw,
    /// none before the tally.
    pub fn tied_proposal_ids(&self) -> BTreeSet<ProposalId> {
        self.ballot_box
            .result()
            .map(|result| result.leaders.clone())
            .unwrap_or_default()
    }

    pub fn tally_result(&self) -> Option<&TallyResult> {
        self.ballot_box.result()
    }

    pub fn events(&self) -> &EventLog {
        &self.log
    }

    /// Notifications with `sequence >= offset`.
    pub fn events_since(&self, offset: u64) -> &[EventRecord] {
        self.log.since(offset)
    }

    pub fn subscribe(&self) -> EventStream {
        self.log.subscribe()
    }

    pub fn snapshot(&self) -> BallotSnapshot {
        BallotSnapshot {
            ballot: self.id,
            question: self.question.clone(),
            administrator: self.access.administrator().clone(),
            phase: self.workflow.status(),
            voters: self.access.voters().map(|v| self.status_of(v)).collect(),
            proposals: self.proposals.all().to_vec(),
            tally: self.ballot_box.result().cloned(),
            winner: self.winning_proposal_id(),
            next_sequence: self.log.next_sequence(),
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn ensure_can_read(&self, caller: &Identity) -> BallotResult<()> {
        match self.policy.proposal_visibility {
            ProposalVisibility::Public => Ok(()),
            ProposalVisibility::VotersOnly => self.access.ensure_voter(caller),
        }
    }

    fn status_of(&self, voter: &Identity) -> VoterStatus {
        if !self.access.is_voter(voter) {
            return VoterStatus::unregistered(voter.clone());
        }
        VoterStatus {
            voter: voter.clone(),
            is_registered: true,
            has_voted: self.ballot_box.has_voted(voter),
            voted_proposal_id: self.ballot_box.vote_of(voter),
        }
    }

    fn phase_changed(&mut self, (previous, new): Transition) {
        info!(ballot = %self.id, %previous, %new, "workflow status changed");
        self.emit(BallotEvent::WorkflowStatusChange { previous, new });
    }

    fn emit(&mut self, event: BallotEvent) {
        self.log.append(self.id, event);
    }

    fn rejected(&self, caller: &Identity, operation: &str, error: &BallotError) {
        if matches!(error, BallotError::NotAuthorized(_)) {
            warn!(ballot = %self.id, caller = %caller, operation, "privileged command rejected");
        }
    }
}
