//! RT scheduling-invariant test harness.
//!
//! # What this proves (or disproves)
//!
//! Across N processing units, the N highest-priority runnable tasks must be
//! the tasks actually executing. This crate does not implement a scheduler;
//! it constructs a workload that makes any violation of that invariant
//! observable, and judges a single run pass/fail.
//!
//! # How the game works
//!
//! Five waves of SCHED_FIFO workers ("players") are spawned in ascending
//! priority order, N per wave:
//!
//! | role         | rank | holds (slot i)   | loop                          |
//! |--------------|------|------------------|-------------------------------|
//! | defense-low  | 2    | low[i]           | yield                         |
//! | defense-mid  | 3    | mid[i], low[i]   | yield                         |
//! | offense      | 5    | none             | yield, bump the ball counter  |
//! | defense-high | 10   | mid[i]           | yield                         |
//! | crazy-fan    | 15   | none             | yield, spin ~1ms, sleep 2ms   |
//!
//! defense-high (rank 10) blocks on `mid[i]`, already held by defense-mid
//! (rank 3), which itself blocks on `low[i]`, held by defense-low (rank 2):
//! a two-level priority inversion. With priority inheritance the holders are
//! boosted above offense (rank 5) and the ball never moves. Without it,
//! offense preempts the unboosted holders and increments the ball — the
//! observable symptom the referee checks for.
//!
//! # Correctness invariants
//!
//! - Lock order is fixed everywhere: mid outermost, low innermost; release
//!   is strictly reverse (RAII guard drop order). No deadlock by construction.
//! - Each lock slot has exactly one long-term holder for the whole run.
//! - The ball counter is written only by offense, reset/sampled only by the
//!   referee; the stop flag is written once, by the referee.
//! - Every wave is gated on a check-in barrier with a hard timeout; a run
//!   either fully passes or fails loudly. No retries.
//!
//! # Entry points
//!
//! - [`run_game`] / [`GameConfig`]: run one timed game and get a verdict.
//! - [`Host`]: the capability seam (spawn at a FIFO rank, cpu count).
//!   [`FifoHost`] is the real thing; [`FairHost`] ignores ranks so the
//!   harness can run (and demonstrably detect the missing boosting) without
//!   RT privileges.

pub mod barrier;
pub mod context;
pub mod error;
pub mod host;
pub mod lock;
pub mod players;
pub mod referee;

pub use barrier::CheckinBarrier;
pub use context::GameCtx;
pub use error::GameError;
pub use host::{FairHost, FifoHost, Host, Priority};
pub use lock::{LockChain, LockKind, PiMutex, SlotGuard};
pub use players::{Role, LADDER};
pub use referee::{run_game, GameConfig, GameReport, REFEREE_RANK};
