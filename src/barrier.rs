//! Check-in barrier: poll-with-timeout rendezvous between waves.
//!
//! The players come from the OS scheduler, not from an executor this crate
//! controls, so a counting-semaphore rendezvous would still need the same
//! wall-clock escape hatch. A fixed-interval poll of the shared ready count
//! keeps the failure mode simple: either the wave's cumulative total shows
//! up in time, or the referee gets a timeout carrying expected vs. actual
//! and aborts before the game window ever starts.

use std::thread;
use std::time::{Duration, Instant};

use crate::context::GameCtx;

/// How long a wave may take to fully check in (reference design: 30 s).
pub const DEFAULT_CHECKIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Poll interval while waiting on a wave.
pub const DEFAULT_CHECKIN_POLL: Duration = Duration::from_millis(1);

/// A wave that failed to check in before the deadline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CheckinTimeout {
    /// Cumulative ready count the wave had to reach.
    pub expected: usize,
    /// Ready count observed when the deadline expired.
    pub actual: usize,
}

/// Poll-with-timeout barrier over [`GameCtx::players_ready`].
#[derive(Clone, Copy, Debug)]
pub struct CheckinBarrier {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for CheckinBarrier {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_CHECKIN_POLL,
            timeout: DEFAULT_CHECKIN_TIMEOUT,
        }
    }
}

impl CheckinBarrier {
    /// Blocks until the ready count reaches `expected` (cumulative across
    /// all waves so far), or the timeout expires.
    ///
    /// Checks before sleeping, so an already-satisfied wave passes even
    /// with a zero timeout.
    pub fn wait_for(&self, ctx: &GameCtx, expected: usize) -> Result<(), CheckinTimeout> {
        let start = Instant::now();
        loop {
            let actual = ctx.players_ready();
            if actual >= expected {
                return Ok(());
            }
            if start.elapsed() >= self.timeout {
                return Err(CheckinTimeout { expected, actual });
            }
            thread::sleep(self.poll_interval);
        }
    }
}
