//! Ballot - single-question voting engine
//!
//! One administrator drives a ballot through strictly ordered phases:
//! voter registration, proposal collection, voting, tally and, on a tie,
//! administrator arbitration. Registered voters submit proposals and cast
//! one irrevocable vote each.
//!
//! Key principles:
//! - Every command validates fully before it mutates anything
//! - No out-of-phase, unauthorized or repeated actions
//! - Bounded proposal volume
//! - Every committed change is recorded in an ordered, replayable log

pub mod ballot;
pub mod script;
pub mod serialization;

pub use ballot::{
    Ballot, BallotError, BallotEvent, BallotHandle, BallotId, BallotPolicy, BallotResult,
    BallotSnapshot, EventRecord, Identity, Proposal, ProposalId, ProposalVisibility,
    TallyOutcome, WorkflowStatus,
};
