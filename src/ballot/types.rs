//! Core ballot value types.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Proposal identifier. Assigned sequentially from 0 in submission order.
pub type ProposalId = u64;

/// Opaque participant key (address-like).
///
/// The engine never interprets the contents; two identities are the same
/// participant exactly when their strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(pub String);

impl Identity {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for Identity {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Identifier of one ballot lifecycle. A reset starts a new lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BallotId(pub Uuid);

impl BallotId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for BallotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A candidate option submitted during the proposal phase.
///
/// Immutable once stored, except for `vote_count`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub description: String,
    pub vote_count: u64,
}

/// Registration and voting state of one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterStatus {
    pub voter: Identity,
    pub is_registered: bool,
    pub has_voted: bool,
    pub voted_proposal_id: Option<ProposalId>,
}

impl VoterStatus {
    /// Status of an identity that is not on the allow-list.
    pub fn unregistered(voter: Identity) -> Self {
        Self {
            voter,
            is_registered: false,
            has_voted: false,
            voted_proposal_id: None,
        }
    }
}
