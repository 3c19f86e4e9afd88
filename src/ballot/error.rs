//! Ballot error taxonomy.
//!
//! Every failure is a local, synchronous validation failure. Commands check
//! all of their preconditions before touching state, so an `Err` always
//! means nothing was committed and nothing was logged.

use super::types::{Identity, ProposalId};
use super::workflow::WorkflowStatus;

/// Result type for ballot operations
pub type BallotResult<T> = Result<T, BallotError>;

/// Ballot command and query errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BallotError {
    #[error("{0} is not authorized to perform this operation")]
    NotAuthorized(Identity),

    #[error("cannot move from {current} to {requested}")]
    PhaseOrderViolation {
        current: WorkflowStatus,
        requested: WorkflowStatus,
    },

    #[error("operation requires phase {expected}, current phase is {current}")]
    WrongPhase {
        expected: WorkflowStatus,
        current: WorkflowStatus,
    },

    #[error("{0} is not a registered voter")]
    NotAVoter(Identity),

    #[error("{0} is already registered")]
    AlreadyRegistered(Identity),

    #[error("{0} has already voted")]
    AlreadyVoted(Identity),

    #[error("proposal description is empty")]
    EmptyProposal,

    #[error("ballot question is empty")]
    EmptyQuestion,

    #[error("proposal already submitted as #{0}")]
    DuplicateProposal(ProposalId),

    #[error("too many proposals (limit {0})")]
    ProposalLimitExceeded(usize),

    #[error("proposal #{0} not found")]
    ProposalNotFound(ProposalId),

    #[error("votes must be tallied before arbitration")]
    TallyNotAttempted,

    #[error("proposal #{0} is not among the tied proposals")]
    InvalidArbitrationChoice(ProposalId),

    #[error("no proposals were submitted")]
    NoProposals,
}

impl BallotError {
    /// Stable name of the error kind, used by scripts to declare expected failures.
    pub fn kind(&self) -> &'static str {
        match self {
            BallotError::NotAuthorized(_) => "NotAuthorized",
            BallotError::PhaseOrderViolation { .. } => "PhaseOrderViolation",
            BallotError::WrongPhase { .. } => "WrongPhase",
            BallotError::NotAVoter(_) => "NotAVoter",
            BallotError::AlreadyRegistered(_) => "AlreadyRegistered",
            BallotError::AlreadyVoted(_) => "AlreadyVoted",
            BallotError::EmptyProposal => "EmptyProposal",
            BallotError::EmptyQuestion => "EmptyQuestion",
            BallotError::DuplicateProposal(_) => "DuplicateProposal",
            BallotError::ProposalLimitExceeded(_) => "ProposalLimitExceeded",
            BallotError::ProposalNotFound(_) => "ProposalNotFound",
            BallotError::TallyNotAttempted => "TallyNotAttempted",
            BallotError::InvalidArbitrationChoice(_) => "InvalidArbitrationChoice",
            BallotError::NoProposals => "NoProposals",
        }
    }
}
