//! Property-based tests for the ballot engine
//!
//! Tests for:
//! - Workflow: phases only move forward or reset, phase-gated commands
//! - Ballot box: repeated votes always rejected, hasVoted is sticky
//! - Tally: same votes give the same result regardless of casting order
//! - Proposals: duplicates detected after trimming

use super::{Ballot, BallotError, BallotPolicy, Identity, TallyOutcome, WorkflowStatus};
use proptest::prelude::*;

fn admin() -> Identity {
    Identity::from("admin")
}

fn voter(i: usize) -> Identity {
    Identity::new(format!("voter-{}", i))
}

/// `voters` registered, `proposals` submitted, voting open.
fn voting_ballot(voters: usize, proposals: usize) -> Ballot {
    let mut ballot = Ballot::new(admin(), "q", BallotPolicy::default()).unwrap();
    for i in 0..voters {
        ballot.register_voter(&admin(), voter(i)).unwrap();
    }
    ballot.advance_phase(&admin()).unwrap();
    for p in 0..proposals {
        ballot
            .submit_proposal(&voter(0), &format!("proposal {}", p))
            .unwrap();
    }
    ballot.advance_phase(&admin()).unwrap();
    ballot.advance_phase(&admin()).unwrap();
    ballot
}

#[derive(Debug, Clone)]
enum Op {
    Advance,
    AdvanceTo(usize),
    Register(usize),
    Submit(usize),
    Vote(usize, u64),
    Tally,
    ResolveTie(u64),
    Reset,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => Just(Op::Advance),
        1 => (0..WorkflowStatus::ALL.len()).prop_map(Op::AdvanceTo),
        2 => (0usize..4).prop_map(Op::Register),
        2 => (0usize..4).prop_map(Op::Submit),
        2 => ((0usize..4), (0u64..4)).prop_map(|(v, p)| Op::Vote(v, p)),
        1 => Just(Op::Tally),
        1 => (0u64..4).prop_map(Op::ResolveTie),
        1 => Just(Op::Reset),
    ]
}

// ============================================================================
// WORKFLOW PROPERTY TESTS
// ============================================================================

proptest! {
    /// Property: Phase only moves forward or resets
    /// Across any command sequence, every phase change either increases the
    /// phase or returns to RegisteringVoters through a reset
    #[test]
    fn phase_moves_forward_or_resets(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let mut ballot = Ballot::new(admin(), "q", BallotPolicy::default()).unwrap();

        for op in ops {
            let before = ballot.current_phase();
            let is_reset = matches!(op, Op::Reset);

            let _ = match op {
                Op::Advance => ballot.advance_phase(&admin()).map(|_| ()),
                Op::AdvanceTo(i) => ballot
                    .advance_to(&admin(), WorkflowStatus::ALL[i])
                    .map(|_| ()),
                Op::Register(v) => ballot.register_voter(&admin(), voter(v)),
                Op::Submit(v) => ballot.submit_proposal(&voter(v), &format!("p{}", v)).map(|_| ()),
                Op::Vote(v, p) => ballot.cast_vote(&voter(v), p),
                Op::Tally => ballot.tally(&admin()).map(|_| ()),
                Op::ResolveTie(p) => ballot.resolve_tie(&admin(), p),
                Op::Reset => ballot.reset_ballot(&admin()).map(|_| ()),
            };

            let after = ballot.current_phase();
            if is_reset {
                prop_assert_eq!(after, WorkflowStatus::RegisteringVoters);
            } else {
                prop_assert!(after >= before, "phase went back from {} to {}", before, after);
            }
        }
    }

    /// Property: Phase-gated commands fail outside their phase
    /// Proposal submission only succeeds in ProposalsRegistrationStarted
    #[test]
    fn submit_only_in_proposal_phase(advances in 0usize..4) {
        let mut ballot = Ballot::new(admin(), "q", BallotPolicy::default()).unwrap();
        ballot.register_voter(&admin(), voter(0)).unwrap();
        for step in 0..advances {
            ballot.advance_phase(&admin()).unwrap();
            if step == 0 {
                ballot.submit_proposal(&voter(0), "seed").unwrap();
            }
        }

        let result = ballot.submit_proposal(&voter(0), "late");
        if ballot.current_phase() == WorkflowStatus::ProposalsRegistrationStarted {
            prop_assert!(result.is_ok());
        } else {
            let is_wrong_phase = matches!(result, Err(BallotError::WrongPhase { .. }));
            prop_assert!(is_wrong_phase);
        }
    }
}

// ============================================================================
// BALLOT BOX PROPERTY TESTS
// ============================================================================

proptest! {
    /// Property: Second vote always rejected
    /// After a successful vote, every later vote by the same voter fails with
    /// AlreadyVoted whatever its target, and counts do not move
    #[test]
    fn second_vote_always_rejected(
        first in 0u64..5,
        retries in prop::collection::vec(0u64..8, 1..10),
    ) {
        let mut ballot = voting_ballot(1, 5);
        ballot.cast_vote(&voter(0), first).unwrap();

        for target in retries {
            prop_assert_eq!(
                ballot.cast_vote(&voter(0), target),
                Err(BallotError::AlreadyVoted(voter(0)))
            );
        }

        let total: u64 = ballot
            .all_proposals(&voter(0))
            .unwrap()
            .iter()
            .map(|p| p.vote_count)
            .sum();
        prop_assert_eq!(total, 1);
        let status = ballot.voter_status(&voter(0), &voter(0)).unwrap();
        prop_assert!(status.has_voted);
        prop_assert_eq!(status.voted_proposal_id, Some(first));
    }

    /// Property: hasVoted is sticky until reset
    #[test]
    fn has_voted_sticky_until_reset(target in 0u64..3, closes in 0usize..2) {
        let mut ballot = voting_ballot(2, 3);
        ballot.cast_vote(&voter(1), target).unwrap();

        for _ in 0..closes {
            ballot.advance_phase(&admin()).unwrap();
        }
        prop_assert!(ballot.voter_status(&voter(1), &voter(1)).unwrap().has_voted);

        ballot.reset_ballot(&admin()).unwrap();
        ballot.register_voter(&admin(), voter(1)).unwrap();
        let status = ballot.voter_status(&voter(1), &voter(1)).unwrap();
        prop_assert!(!status.has_voted);
        prop_assert_eq!(status.voted_proposal_id, None);
    }
}

// ============================================================================
// TALLY PROPERTY TESTS
// ============================================================================

fn assignment_and_order() -> impl Strategy<Value = (Vec<u64>, Vec<usize>)> {
    prop::collection::vec(0u64..4, 1..20).prop_flat_map(|votes| {
        let order: Vec<usize> = (0..votes.len()).collect();
        (Just(votes), Just(order).prop_shuffle())
    })
}

proptest! {
    /// Property: Tally determinism
    /// The same votes cast in any order give the same winner or tied set
    #[test]
    fn tally_independent_of_vote_order((votes, order) in assignment_and_order()) {
        let run = |sequence: &[usize]| {
            let mut ballot = voting_ballot(votes.len(), 4);
            for &i in sequence {
                ballot.cast_vote(&voter(i), votes[i]).unwrap();
            }
            ballot.advance_phase(&admin()).unwrap();
            ballot.tally(&admin()).unwrap()
        };

        let in_order: Vec<usize> = (0..votes.len()).collect();
        let baseline = run(&in_order);
        let shuffled = run(&order);
        prop_assert_eq!(&baseline, &shuffled);

        let mut counts = [0u64; 4];
        for &p in &votes {
            counts[p as usize] += 1;
        }
        let max = counts.iter().copied().max().unwrap_or(0);
        let leaders: Vec<u64> = (0..4u64).filter(|&p| counts[p as usize] == max).collect();
        match baseline {
            TallyOutcome::Winner(id) => prop_assert_eq!(leaders, vec![id]),
            TallyOutcome::Draw(tied) => {
                prop_assert_eq!(leaders, tied.into_iter().collect::<Vec<_>>())
            }
        }
    }
}

// ============================================================================
// PROPOSAL PROPERTY TESTS
// ============================================================================

proptest! {
    /// Property: Duplicates detected after trimming
    /// Resubmitting a description with extra surrounding whitespace always
    /// fails with DuplicateProposal pointing at the first id
    #[test]
    fn duplicate_detected_after_trim(
        text in "[A-Za-z0-9][A-Za-z0-9 ]{0,30}[A-Za-z0-9]",
        left in " {0,3}",
        right in "[ \t]{0,3}",
    ) {
        let mut ballot = Ballot::new(admin(), "q", BallotPolicy::default()).unwrap();
        ballot.register_voter(&admin(), voter(0)).unwrap();
        ballot.advance_phase(&admin()).unwrap();

        let id = ballot.submit_proposal(&voter(0), &text).unwrap();
        let padded = format!("{}{}{}", left, text, right);
        prop_assert_eq!(
            ballot.submit_proposal(&voter(0), &padded),
            Err(BallotError::DuplicateProposal(id))
        );
    }
}
