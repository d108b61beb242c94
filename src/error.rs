//! Failure taxonomy for a game run.
//!
//! Every variant is fail-fast: there are no retries anywhere in the
//! harness. A run either returns a passing report or exactly one of these,
//! and the variant that matters most — [`GameError::InvariantViolation`] —
//! is an error precisely so callers cannot treat it as a log line.

use std::error::Error;
use std::fmt;
use std::io;

use crate::players::Role;

#[derive(Debug)]
pub enum GameError {
    /// A lock slot could not be initialized. Fatal before any spawn.
    LockSetup(io::Error),

    /// Thread creation or priority assignment failed for one player.
    /// Already-spawned players are stopped and joined before this surfaces.
    Spawn { name: String, source: io::Error },

    /// A wave missed its check-in deadline. Remaining waves are skipped.
    Checkin {
        role: Role,
        expected: usize,
        actual: usize,
    },

    /// The ball moved: the N-highest-priority invariant was violated.
    InvariantViolation { final_ball_pos: u64 },

    /// Players still alive after the join grace period expired.
    Stragglers { stalled: usize },

    /// The referee thread died without delivering a verdict.
    RefereeLost,
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::LockSetup(e) => write!(f, "failed to initialize lock chain: {e}"),
            GameError::Spawn { name, source } => {
                write!(f, "failed to spawn player {name}: {source}")
            }
            GameError::Checkin {
                role,
                expected,
                actual,
            } => write!(
                f,
                "{} players took too long to check in (only {actual} of {expected} checked in)",
                role.name()
            ),
            GameError::InvariantViolation { final_ball_pos } => write!(
                f,
                "scheduling invariant violated: final ball_pos = {final_ball_pos} (expected 0)"
            ),
            GameError::Stragglers { stalled } => write!(
                f,
                "{stalled} player(s) failed to observe the stop flag within the join grace period"
            ),
            GameError::RefereeLost => write!(f, "referee thread exited without a verdict"),
        }
    }
}

impl Error for GameError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GameError::LockSetup(e) | GameError::Spawn { source: e, .. } => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkin_message_carries_both_counts() {
        let msg = GameError::Checkin {
            role: Role::DefenseMid,
            expected: 8,
            actual: 5,
        }
        .to_string();
        assert!(msg.contains("defense-mid"));
        assert!(msg.contains("5 of 8"));
    }

    #[test]
    fn violation_message_carries_final_position() {
        let msg = GameError::InvariantViolation { final_ball_pos: 42 }.to_string();
        assert!(msg.contains("42"));
    }

    #[test]
    fn io_sources_are_chained() {
        let err = GameError::Spawn {
            name: "offense-0".into(),
            source: io::Error::from_raw_os_error(libc::EPERM),
        };
        assert!(err.source().is_some());
    }
}
