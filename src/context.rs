//! Shared run context: everything every player can see.
//!
//! One [`GameCtx`] per run, created by the referee before the first wave and
//! dropped only after every player has been joined, so the lock chains are
//! destroyed strictly after their last holder exits. Players hold an `Arc`
//! and touch exactly three cells plus their own lock slots; nothing here is
//! ambient or process-global.
//!
//! All atomics use `Relaxed`: each cell is an independent monotonic counter
//! or a one-way latch, and the protocol never orders one cell against
//! another (the pass predicate only compares the ball against zero).

use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use crate::error::GameError;
use crate::lock::{LockChain, LockKind};

/// Shared state for one game run.
#[derive(Debug)]
pub struct GameCtx {
    team_size: usize,
    /// Bumped once per player, immediately after it starts.
    players_ready: CachePadded<AtomicUsize>,
    /// "Ball position": written only by offense, reset/sampled by the referee.
    ball_pos: CachePadded<AtomicU64>,
    /// One-way stop latch, written once by the referee.
    game_over: CachePadded<AtomicBool>,
    /// Inner tier: held by defense-low, also taken by defense-mid.
    pub low: LockChain,
    /// Outer tier: held by defense-mid, contended by defense-high.
    pub mid: LockChain,
}

impl GameCtx {
    /// Allocates both lock tiers and zeroes the shared cells.
    ///
    /// # Errors
    ///
    /// [`GameError::LockSetup`] if a slot cannot be initialized; nothing has
    /// been spawned at that point, so the failure is purely local.
    pub fn new(team_size: usize, kind: LockKind) -> Result<Self, GameError> {
        assert!(team_size >= 1, "team_size must be >= 1");
        Ok(Self {
            team_size,
            players_ready: CachePadded::new(AtomicUsize::new(0)),
            ball_pos: CachePadded::new(AtomicU64::new(0)),
            game_over: CachePadded::new(AtomicBool::new(false)),
            low: LockChain::new(team_size, kind).map_err(GameError::LockSetup)?,
            mid: LockChain::new(team_size, kind).map_err(GameError::LockSetup)?,
        })
    }

    pub fn team_size(&self) -> usize {
        self.team_size
    }

    /// Called exactly once by each player, before acquiring any slot.
    pub fn check_in(&self) {
        self.players_ready.fetch_add(1, Ordering::Relaxed);
    }

    pub fn players_ready(&self) -> usize {
        self.players_ready.load(Ordering::Relaxed)
    }

    pub fn is_over(&self) -> bool {
        self.game_over.load(Ordering::Relaxed)
    }

    /// Flips the stop latch. Idempotent; called once per run in practice.
    pub fn end_game(&self) {
        self.game_over.store(true, Ordering::Relaxed);
    }

    /// Offense only: advance the ball by one.
    pub fn move_ball(&self) {
        self.ball_pos.fetch_add(1, Ordering::Relaxed);
    }

    /// Referee only: zero the ball at the start of the game window.
    pub fn reset_ball(&self) {
        self.ball_pos.store(0, Ordering::Relaxed);
    }

    pub fn ball_pos(&self) -> u64 {
        self.ball_pos.load(Ordering::Relaxed)
    }
}
