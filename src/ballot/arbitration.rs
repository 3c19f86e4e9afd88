//! Administrator tie-break.
//!
//! Only reachable after a tally produced more than one leader. The choice
//! must be one of those leaders.

use super::ballot_box::TallyResult;
use super::error::{BallotError, BallotResult};
use super::types::ProposalId;
use super::workflow::{WorkflowStateMachine, WorkflowStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArbitrationResolver {
    decision: Option<ProposalId>,
}

impl ArbitrationResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// The arbitrated winner, once chosen.
    pub fn decision(&self) -> Option<ProposalId> {
        self.decision
    }

    pub fn resolve(
        &mut self,
        choice: ProposalId,
        workflow: &WorkflowStateMachine,
        tally: Option<&TallyResult>,
    ) -> BallotResult<()> {
        let current = workflow.status();
        if current < WorkflowStatus::ArbitrationPending {
            return Err(BallotError::TallyNotAttempted);
        }
        let tally = tally.ok_or(BallotError::TallyNotAttempted)?;

        // After a draw, a pick outside the tied set is invalid whether or not
        // arbitration already concluded.
        if tally.is_draw() && !tally.leaders.contains(&choice) {
            return Err(BallotError::InvalidArbitrationChoice(choice));
        }
        if current != WorkflowStatus::ArbitrationPending {
            return Err(BallotError::WrongPhase {
                expected: WorkflowStatus::ArbitrationPending,
                current,
            });
        }

        self.decision = Some(choice);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.decision = None;
    }
}
