//! Per-ballot policy knobs.

use serde::{Deserialize, Serialize};

/// Default upper bound on the number of proposals in one ballot.
pub const DEFAULT_PROPOSAL_CAP: usize = 1000;

/// Who may read proposals and voter status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalVisibility {
    /// Only registered voters may read.
    #[default]
    VotersOnly,
    /// Anyone may read.
    Public,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotPolicy {
    /// Maximum number of proposals. Bounds the cost of a tally.
    #[serde(default = "default_proposal_cap")]
    pub proposal_cap: usize,

    #[serde(default)]
    pub proposal_visibility: ProposalVisibility,
}

fn default_proposal_cap() -> usize {
    DEFAULT_PROPOSAL_CAP
}

impl Default for BallotPolicy {
    fn default() -> Self {
        Self {
            proposal_cap: DEFAULT_PROPOSAL_CAP,
            proposal_visibility: ProposalVisibility::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("proposal_cap must be at least 1")]
    ZeroProposalCap,
}

impl BallotPolicy {
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.proposal_cap == 0 {
            return Err(PolicyError::ZeroProposalCap);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = BallotPolicy::default();
        assert_eq!(policy.proposal_cap, 1000);
        assert_eq!(policy.proposal_visibility, ProposalVisibility::VotersOnly);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_zero_cap_rejected() {
        let policy = BallotPolicy {
            proposal_cap: 0,
            ..Default::default()
        };
        assert_eq!(policy.validate(), Err(PolicyError::ZeroProposalCap));
    }

    #[test]
    fn test_visibility_serde_names() {
        let json = serde_json::to_string(&ProposalVisibility::VotersOnly).unwrap();
        assert_eq!(json, "\"voters_only\"");
        let parsed: ProposalVisibility = serde_json::from_str("\"public\"").unwrap();
        assert_eq!(parsed, ProposalVisibility::Public);
    }
}
