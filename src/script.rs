//! Scripted ballot sessions.
//!
//! A script is a TOML file with one `[[step]]` table per command:
//!
//! ```toml
//! [[step]]
//! caller = "admin"
//! action = "register_voter"
//! voter = "alice"
//!
//! [[step]]
//! caller = "mallory"
//! action = "advance"
//! expect_error = "NotAuthorized"
//! ```
//!
//! Steps run in order against one [`Ballot`]. A step whose outcome does not
//! match its `expect_error` (or that fails without one) stops the run.

use crate::ballot::{
    Ballot, BallotError, Identity, ProposalId, TallyOutcome, Transition, WorkflowStatus,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read script '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse script: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("step {step} ({action}): expected {expected}, got {actual}")]
    UnexpectedOutcome {
        step: usize,
        action: &'static str,
        expected: String,
        actual: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    RegisterVoter { voter: Identity },
    UnregisterVoter { voter: Identity },
    TransferAdministrator { new_administrator: Identity },
    SetQuestion { question: String },
    Advance,
    AdvanceTo { phase: WorkflowStatus },
    Reset,
    SubmitProposal { description: String },
    CastVote { proposal_id: ProposalId },
    Tally,
    ResolveTie { proposal_id: ProposalId },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::RegisterVoter { .. } => "register_voter",
            Action::UnregisterVoter { .. } => "unregister_voter",
            Action::TransferAdministrator { .. } => "transfer_administrator",
            Action::SetQuestion { .. } => "set_question",
            Action::Advance => "advance",
            Action::AdvanceTo { .. } => "advance_to",
            Action::Reset => "reset",
            Action::SubmitProposal { .. } => "submit_proposal",
            Action::CastVote { .. } => "cast_vote",
            Action::Tally => "tally",
            Action::ResolveTie { .. } => "resolve_tie",
        }
    }

    /// Run this action against `ballot` on behalf of `caller`.
    pub fn apply(&self, ballot: &mut Ballot, caller: &Identity) -> Result<Outcome, BallotError> {
        match self {
            Action::RegisterVoter { voter } => ballot
                .register_voter(caller, voter.clone())
                .map(|_| Outcome::Done),
            Action::UnregisterVoter { voter } => ballot
                .unregister_voter(caller, voter)
                .map(|_| Outcome::Done),
            Action::TransferAdministrator { new_administrator } => ballot
                .transfer_administrator(caller, new_administrator.clone())
                .map(|_| Outcome::Done),
            Action::SetQuestion { question } => ballot
                .set_question(caller, question)
                .map(|_| Outcome::Done),
            Action::Advance => ballot.advance_phase(caller).map(Outcome::PhaseChanged),
            Action::AdvanceTo { phase } => ballot
                .advance_to(caller, *phase)
                .map(Outcome::PhaseChanged),
            Action::Reset => ballot.reset_ballot(caller).map(Outcome::PhaseChanged),
            Action::SubmitProposal { description } => ballot
                .submit_proposal(caller, description)
                .map(Outcome::ProposalRegistered),
            Action::CastVote { proposal_id } => ballot
                .cast_vote(caller, *proposal_id)
                .map(|_| Outcome::Done),
            Action::Tally => ballot.tally(caller).map(Outcome::Tallied),
            Action::ResolveTie { proposal_id } => ballot
                .resolve_tie(caller, *proposal_id)
                .map(|_| Outcome::TieResolved(*proposal_id)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub caller: Identity,

    #[serde(flatten)]
    pub action: Action,

    /// Error kind this step must fail with, e.g. `"AlreadyVoted"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect_error: Option<String>,
}

/// Successful result of one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Done,
    PhaseChanged(Transition),
    ProposalRegistered(ProposalId),
    Tallied(TallyOutcome),
    TieResolved(ProposalId),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Done => write!(f, "ok"),
            Outcome::PhaseChanged((previous, new)) => write!(f, "{} -> {}", previous, new),
            Outcome::ProposalRegistered(id) => write!(f, "proposal #{}", id),
            Outcome::Tallied(TallyOutcome::Winner(id)) => write!(f, "winner #{}", id),
            Outcome::Tallied(TallyOutcome::Draw(tied)) => write!(f, "draw between {:?}", tied),
            Outcome::TieResolved(id) => write!(f, "arbitrated winner #{}", id),
        }
    }
}

/// What happened at one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    /// Position in the script, from 1.
    pub step: usize,
    pub caller: Identity,
    pub action: &'static str,
    pub result: Result<Outcome, BallotError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    #[serde(rename = "step", default)]
    pub steps: Vec<Step>,
}

impl Script {
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ScriptError> {
        Ok(toml::from_str(contents)?)
    }

    /// Run every step, calling `on_step` after each one.
    ///
    /// Returns the number of steps executed.
    pub fn run(
        &self,
        ballot: &mut Ballot,
        mut on_step: impl FnMut(&StepReport),
    ) -> Result<usize, ScriptError> {
        for (index, step) in self.steps.iter().enumerate() {
            let report = StepReport {
                step: index + 1,
                caller: step.caller.clone(),
                action: step.action.name(),
                result: step.action.apply(ballot, &step.caller),
            };
            on_step(&report);
            check_expectation(step, &report)?;
        }
        Ok(self.steps.len())
    }
}

fn check_expectation(step: &Step, report: &StepReport) -> Result<(), ScriptError> {
    let matches = match (&step.expect_error, &report.result) {
        (None, Ok(_)) => true,
        (Some(kind), Err(err)) => err.kind() == kind,
        _ => false,
    };
    if matches {
        return Ok(());
    }

    let expected = match &step.expect_error {
        Some(kind) => format!("error {}", kind),
        None => "success".to_string(),
    };
    let actual = match &report.result {
        Ok(outcome) => format!("success ({})", outcome),
        Err(err) => format!("error {} ({})", err.kind(), err),
    };
    Err(ScriptError::UnexpectedOutcome {
        step: report.step,
        action: report.action,
        expected,
        actual,
    })
}
