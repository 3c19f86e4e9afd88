//! Ballot phase state machine.
//!
//! Phases only ever move forward:
//!
//! ```text
//! RegisteringVoters -> ProposalsRegistrationStarted -> ProposalsRegistrationEnded
//!   -> VotingSessionStarted -> VotingSessionEnded
//!   -> { VotesTallied | ArbitrationPending -> VotesTallied }
//! ```
//!
//! The first four transitions are driven by the administrator through
//! `advance`. The last ones belong to the tally and arbitration protocol.
//! `reset` is the only way back to `RegisteringVoters`.

use super::error::{BallotError, BallotResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered ballot phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WorkflowStatus {
    RegisteringVoters,
    ProposalsRegistrationStarted,
    ProposalsRegistrationEnded,
    VotingSessionStarted,
    VotingSessionEnded,
    /// Tally produced a tie; waiting for the administrator to pick a winner.
    ArbitrationPending,
    VotesTallied,
}

impl WorkflowStatus {
    /// All phases in order.
    pub const ALL: [WorkflowStatus; 7] = [
        WorkflowStatus::RegisteringVoters,
        WorkflowStatus::ProposalsRegistrationStarted,
        WorkflowStatus::ProposalsRegistrationEnded,
        WorkflowStatus::VotingSessionStarted,
        WorkflowStatus::VotingSessionEnded,
        WorkflowStatus::ArbitrationPending,
        WorkflowStatus::VotesTallied,
    ];

    /// The phase `advance` moves to, if the administrator may drive it.
    pub fn admin_successor(self) -> Option<WorkflowStatus> {
        match self {
            WorkflowStatus::RegisteringVoters => Some(WorkflowStatus::ProposalsRegistrationStarted),
            WorkflowStatus::ProposalsRegistrationStarted => {
                Some(WorkflowStatus::ProposalsRegistrationEnded)
            }
            WorkflowStatus::ProposalsRegistrationEnded => Some(WorkflowStatus::VotingSessionStarted),
            WorkflowStatus::VotingSessionStarted => Some(WorkflowStatus::VotingSessionEnded),
            WorkflowStatus::VotingSessionEnded
            | WorkflowStatus::ArbitrationPending
            | WorkflowStatus::VotesTallied => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == WorkflowStatus::VotesTallied
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A phase change: `(previous, new)`.
pub type Transition = (WorkflowStatus, WorkflowStatus);

/// Holds the current phase and guards every other component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowStateMachine {
    status: WorkflowStatus,
}

impl WorkflowStateMachine {
    pub fn new() -> Self {
        Self {
            status: WorkflowStatus::RegisteringVoters,
        }
    }

    pub fn status(&self) -> WorkflowStatus {
        self.status
    }

    /// Fail with `WrongPhase` unless the current phase is `expected`.
    pub fn require(&self, expected: WorkflowStatus) -> BallotResult<()> {
        if self.status != expected {
            return Err(BallotError::WrongPhase {
                expected,
                current: self.status,
            });
        }
        Ok(())
    }

    /// Move to the next administrator-driven phase.
    ///
    /// `proposal_count` feeds the precondition for closing the proposal phase.
    pub fn advance(&mut self, proposal_count: usize) -> BallotResult<Transition> {
        let target = self.next_or_violation()?;
        self.advance_to(target, proposal_count)
    }

    /// Move to `target`, which must be the next administrator-driven phase.
    pub fn advance_to(
        &mut self,
        target: WorkflowStatus,
        proposal_count: usize,
    ) -> BallotResult<Transition> {
        if self.status.admin_successor() != Some(target) {
            return Err(BallotError::PhaseOrderViolation {
                current: self.status,
                requested: target,
            });
        }

        if target == WorkflowStatus::ProposalsRegistrationEnded && proposal_count == 0 {
            return Err(BallotError::NoProposals);
        }

        Ok(self.set(target))
    }

    /// Tally produced a tie.
    pub(crate) fn open_arbitration(&mut self) -> BallotResult<Transition> {
        self.require(WorkflowStatus::VotingSessionEnded)?;
        Ok(self.set(WorkflowStatus::ArbitrationPending))
    }

    /// A winner is known, either straight from the tally or by arbitration.
    pub(crate) fn conclude(&mut self) -> BallotResult<Transition> {
        match self.status {
            WorkflowStatus::VotingSessionEnded | WorkflowStatus::ArbitrationPending => {
                Ok(self.set(WorkflowStatus::VotesTallied))
            }
            current => Err(BallotError::PhaseOrderViolation {
                current,
                requested: WorkflowStatus::VotesTallied,
            }),
        }
    }

    /// Return to the initial phase from anywhere.
    pub fn reset(&mut self) -> Transition {
        self.set(WorkflowStatus::RegisteringVoters)
    }

    fn next_or_violation(&self) -> BallotResult<WorkflowStatus> {
        self.status
            .admin_successor()
            .ok_or(BallotError::PhaseOrderViolation {
                current: self.status,
                requested: WorkflowStatus::VotesTallied,
            })
    }

    fn set(&mut self, new: WorkflowStatus) -> Transition {
        let previous = self.status;
        self.status = new;
        (previous, new)
    }
}

impl Default for WorkflowStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
