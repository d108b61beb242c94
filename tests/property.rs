//! Property tests for barrier accounting and the priority ladder.

use proptest::prelude::*;
use sched_football::{CheckinBarrier, GameCtx, LockKind, Priority, LADDER, REFEREE_RANK};
use std::time::Duration;

proptest! {
    /// With a zero timeout the barrier is a pure predicate: it passes iff
    /// the checked-in count already covers the expectation, and a failure
    /// reports exactly the counts it saw.
    #[test]
    fn zero_timeout_barrier_is_a_pure_predicate(
        checked_in in 0usize..64,
        expected in 0usize..64,
    ) {
        let ctx = GameCtx::new(1, LockKind::Plain).unwrap();
        for _ in 0..checked_in {
            ctx.check_in();
        }
        let barrier = CheckinBarrier {
            poll_interval: Duration::from_millis(1),
            timeout: Duration::ZERO,
        };
        match barrier.wait_for(&ctx, expected) {
            Ok(()) => prop_assert!(checked_in >= expected),
            Err(t) => {
                prop_assert!(checked_in < expected);
                prop_assert_eq!(t.expected, expected);
                prop_assert_eq!(t.actual, checked_in);
            }
        }
    }

    /// Wave accounting: after k waves of n players each, the cumulative
    /// check-in target is k*n, and the full squad is 5n.
    #[test]
    fn cumulative_wave_targets_cover_the_squad(team_size in 1usize..64) {
        let mut expected = 0usize;
        for (wave, _role) in LADDER.iter().enumerate() {
            expected += team_size;
            prop_assert_eq!(expected, (wave + 1) * team_size);
        }
        prop_assert_eq!(expected, LADDER.len() * team_size);
    }
}

#[test]
fn ladder_is_strictly_ascending_and_below_the_referee() {
    for pair in LADDER.windows(2) {
        assert!(pair[0].fifo_rank() < pair[1].fifo_rank());
    }
    for role in LADDER {
        assert!(role.fifo_rank() < REFEREE_RANK);
    }
}

#[test]
fn ranks_match_the_reference_design() {
    let ranks: Vec<u8> = LADDER.iter().map(|r| r.fifo_rank().rank()).collect();
    assert_eq!(ranks, vec![2, 3, 5, 10, 15]);
    assert_eq!(REFEREE_RANK, Priority::new(20));
}
