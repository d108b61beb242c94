//! The five player roles and their loops.
//!
//! Every role follows the same shape: check in, take its assigned slot(s)
//! in the fixed order, then spin on the stop latch, yielding every
//! iteration. Guards release in reverse acquisition order when the loop
//! exits (local drop order), so no role can ever hold the outer tier while
//! re-waiting on the inner one.
//!
//! The inversion is built across three roles on the same slot index:
//! defense-high blocks on `mid[i]` held by defense-mid, which blocks on
//! `low[i]` held by defense-low. Offense holds nothing and just tries to
//! move the ball; crazy-fan holds nothing and just burns cycles above
//! everyone else to add scheduling churn.

use std::thread;
use std::time::{Duration, Instant};

use crate::context::GameCtx;
use crate::host::Priority;

/// How long a fan busy-spins per iteration before napping.
const FAN_SPIN: Duration = Duration::from_micros(1000);
/// How long a fan sleeps per iteration.
const FAN_NAP: Duration = Duration::from_millis(2);

/// Spawn order: strictly ascending FIFO rank.
pub const LADDER: [Role; 5] = [
    Role::DefenseLow,
    Role::DefenseMid,
    Role::Offense,
    Role::DefenseHigh,
    Role::CrazyFan,
];

/// One of the five player behaviors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    DefenseLow,
    DefenseMid,
    Offense,
    DefenseHigh,
    CrazyFan,
}

impl Role {
    /// Fixed SCHED_FIFO rank for this role.
    pub const fn fifo_rank(self) -> Priority {
        match self {
            Role::DefenseLow => Priority::new(2),
            Role::DefenseMid => Priority::new(3),
            Role::Offense => Priority::new(5),
            Role::DefenseHigh => Priority::new(10),
            Role::CrazyFan => Priority::new(15),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Role::DefenseLow => "defense-low",
            Role::DefenseMid => "defense-mid",
            Role::Offense => "offense",
            Role::DefenseHigh => "defense-high",
            Role::CrazyFan => "crazy-fan",
        }
    }

    /// Runs this role's loop to completion on the current thread.
    ///
    /// `slot` is the player's index within its wave; defense roles use it to
    /// pick their lock slot. Returns only after the stop latch is observed
    /// and all held slots are released.
    pub fn play(self, ctx: &GameCtx, slot: usize) {
        match self {
            Role::DefenseLow => defense_low(ctx, slot),
            Role::DefenseMid => defense_mid(ctx, slot),
            Role::Offense => offense(ctx),
            Role::DefenseHigh => defense_high(ctx, slot),
            Role::CrazyFan => crazy_fan(ctx),
        }
    }
}

fn defense_low(ctx: &GameCtx, slot: usize) {
    ctx.check_in();
    let _low = ctx.low.acquire(slot);
    while !ctx.is_over() {
        thread::yield_now();
    }
    // _low released here
}

fn defense_mid(ctx: &GameCtx, slot: usize) {
    ctx.check_in();
    let _mid = ctx.mid.acquire(slot);
    let _low = ctx.low.acquire(slot);
    while !ctx.is_over() {
        thread::yield_now();
    }
    // drops run in reverse declaration order: low first, then mid
}

fn offense(ctx: &GameCtx) {
    ctx.check_in();
    while !ctx.is_over() {
        thread::yield_now();
        ctx.move_ball();
    }
}

fn defense_high(ctx: &GameCtx, slot: usize) {
    ctx.check_in();
    let _mid = ctx.mid.acquire(slot);
    while !ctx.is_over() {
        thread::yield_now();
    }
}

fn crazy_fan(ctx: &GameCtx) {
    ctx.check_in();
    while !ctx.is_over() {
        thread::yield_now();
        spin_for(FAN_SPIN);
        thread::sleep(FAN_NAP);
    }
}

/// Busy-wait without yielding: pure CPU noise at the fan's rank.
fn spin_for(d: Duration) {
    let end = Instant::now() + d;
    while Instant::now() < end {
        std::hint::spin_loop();
    }
}

// ============================================================================
// Tests
// ============================================================================
