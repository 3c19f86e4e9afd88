//! Administrator and voter allow-list.
//!
//! Registration is only open while the ballot is in `RegisteringVoters`.

use super::error::{BallotError, BallotResult};
use super::types::Identity;
use super::workflow::{WorkflowStateMachine, WorkflowStatus};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessControl {
    administrator: Identity,
    voters: BTreeSet<Identity>,
}

impl AccessControl {
    pub fn new(administrator: Identity) -> Self {
        Self {
            administrator,
            voters: BTreeSet::new(),
        }
    }

    pub fn administrator(&self) -> &Identity {
        &self.administrator
    }

    pub fn is_administrator(&self, caller: &Identity) -> bool {
        &self.administrator == caller
    }

    pub fn ensure_administrator(&self, caller: &Identity) -> BallotResult<()> {
        if !self.is_administrator(caller) {
            return Err(BallotError::NotAuthorized(caller.clone()));
        }
        Ok(())
    }

    pub fn is_voter(&self, id: &Identity) -> bool {
        self.voters.contains(id)
    }

    pub fn ensure_voter(&self, id: &Identity) -> BallotResult<()> {
        if !self.is_voter(id) {
            return Err(BallotError::NotAVoter(id.clone()));
        }
        Ok(())
    }

    /// Registered voters in identity order.
    pub fn voters(&self) -> impl Iterator<Item = &Identity> {
        self.voters.iter()
    }

    pub fn voter_count(&self) -> usize {
        self.voters.len()
    }

    pub fn register(
        &mut self,
        caller: &Identity,
        voter: Identity,
        workflow: &WorkflowStateMachine,
    ) -> BallotResult<()> {
        self.ensure_administrator(caller)?;
        workflow.require(WorkflowStatus::RegisteringVoters)?;

        if self.voters.contains(&voter) {
            return Err(BallotError::AlreadyRegistered(voter));
        }

        self.voters.insert(voter);
        Ok(())
    }

    pub fn unregister(
        &mut self,
        caller: &Identity,
        voter: &Identity,
        workflow: &WorkflowStateMachine,
    ) -> BallotResult<()> {
        self.ensure_administrator(caller)?;
        workflow.require(WorkflowStatus::RegisteringVoters)?;
        self.ensure_voter(voter)?;

        self.voters.remove(voter);
        Ok(())
    }

    /// Hand the administrator role to `new_administrator`. Returns the previous holder.
    pub fn transfer_administrator(
        &mut self,
        caller: &Identity,
        new_administrator: Identity,
    ) -> BallotResult<Identity> {
        self.ensure_administrator(caller)?;
        Ok(std::mem::replace(&mut self.administrator, new_administrator))
    }

    /// Drop every voter. The administrator is kept.
    pub fn clear(&mut self) {
        self.voters.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(key: &str) -> Identity {
        Identity::from(key)
    }

    #[test]
    fn test_register_voter() {
        let workflow = WorkflowStateMachine::new();
        let mut access = AccessControl::new(id("admin"));

        access.register(&id("admin"), id("alice"), &workflow).unwrap();

        assert!(access.is_voter(&id("alice")));
        assert_eq!(access.voter_count(), 1);
    }

    #[test]
    fn test_register_twice_rejected() {
        let workflow = WorkflowStateMachine::new();
        let mut access = AccessControl::new(id("admin"));
        access.register(&id("admin"), id("alice"), &workflow).unwrap();

        assert_eq!(
            access.register(&id("admin"), id("alice"), &workflow),
            Err(BallotError::AlreadyRegistered(id("alice")))
        );
    }

    #[test]
    fn test_only_administrator_registers() {
        let workflow = WorkflowStateMachine::new();
        let mut access = AccessControl::new(id("admin"));

        assert_eq!(
            access.register(&id("mallory"), id("mallory"), &workflow),
            Err(BallotError::NotAuthorized(id("mallory")))
        );
        assert_eq!(access.voter_count(), 0);
    }

    #[test]
    fn test_registration_closed_after_first_phase() {
        let mut workflow = WorkflowStateMachine::new();
        workflow.advance(0).unwrap();
        let mut access = AccessControl::new(id("admin"));

        assert!(matches!(
            access.register(&id("admin"), id("alice"), &workflow),
            Err(BallotError::WrongPhase {
                expected: WorkflowStatus::RegisteringVoters,
                ..
            })
        ));
    }

    #[test]
    fn test_unregister() {
        let workflow = WorkflowStateMachine::new();
        let mut access = AccessControl::new(id("admin"));
        access.register(&id("admin"), id("alice"), &workflow).unwrap();

        access.unregister(&id("admin"), &id("alice"), &workflow).unwrap();
        assert!(!access.is_voter(&id("alice")));

        assert_eq!(
            access.unregister(&id("admin"), &id("alice"), &workflow),
            Err(BallotError::NotAVoter(id("alice")))
        );
    }

    #[test]
    fn test_transfer_administrator() {
        let mut access = AccessControl::new(id("admin"));

        assert_eq!(
            access.transfer_administrator(&id("bob"), id("bob")),
            Err(BallotError::NotAuthorized(id("bob")))
        );

        let previous = access
            .transfer_administrator(&id("admin"), id("carol"))
            .unwrap();
        assert_eq!(previous, id("admin"));
        assert!(access.is_administrator(&id("carol")));
        assert!(access.ensure_administrator(&id("admin")).is_err());
    }
}
