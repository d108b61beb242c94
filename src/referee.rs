//! The referee: spawns the waves, times the game, judges the result.
//!
//! Linear state machine, no backward transitions:
//!
//! ```text
//! INIT -> SPAWN(low) -> BARRIER -> SPAWN(mid) -> BARRIER
//!      -> SPAWN(offense) -> BARRIER -> SPAWN(high) -> BARRIER
//!      -> SPAWN(fan) -> BARRIER -> RUN_WINDOW -> STOP -> REPORT -> DONE
//! ```
//!
//! Any spawn failure or check-in timeout short-circuits to STOP (stop latch
//! set, spawned players joined best-effort) and surfaces the original
//! failure. The referee itself runs as a rank-20 FIFO thread — above every
//! player — so the game it referees can never starve its own timer or stop
//! logic.
//!
//! Phase transitions are logged to stderr; the verdict travels as a
//! `Result`, never as a log line.

use crossbeam_channel as chan;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::barrier::{CheckinBarrier, DEFAULT_CHECKIN_POLL, DEFAULT_CHECKIN_TIMEOUT};
use crate::context::GameCtx;
use crate::error::GameError;
use crate::host::{Host, Priority};
use crate::lock::LockKind;
use crate::players::{Role, LADDER};

/// The referee outranks every player, fans included.
pub const REFEREE_RANK: Priority = Priority::new(20);

/// Interval at which teardown polls players for completion.
const JOIN_POLL: Duration = Duration::from_millis(1);

// ============================================================================
// Configuration
// ============================================================================

/// Knobs for one game run.
#[derive(Clone, Copy, Debug)]
pub struct GameConfig {
    /// Players per role. `None` = one per processing unit (full occupancy,
    /// which is what the invariant is stated over).
    pub team_size: Option<usize>,
    /// Length of the timed window.
    pub game_time: Duration,
    /// Per-wave check-in deadline.
    pub checkin_timeout: Duration,
    /// Barrier poll interval.
    pub checkin_poll: Duration,
    /// How long teardown waits for players to observe the stop latch before
    /// declaring them stragglers.
    pub join_grace: Duration,
    /// Lock protocol for both tiers. `Plain` exists to demonstrate
    /// detection; a run expected to pass uses `PriorityInheritance`.
    pub lock_kind: LockKind,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            team_size: None,
            game_time: Duration::from_secs(10),
            checkin_timeout: DEFAULT_CHECKIN_TIMEOUT,
            checkin_poll: DEFAULT_CHECKIN_POLL,
            join_grace: Duration::from_secs(10),
            lock_kind: LockKind::PriorityInheritance,
        }
    }
}

impl GameConfig {
    /// Validates configuration. Panics on invalid values.
    pub fn validate(&self) {
        assert!(!self.game_time.is_zero(), "game_time must be > 0");
        assert!(!self.checkin_poll.is_zero(), "checkin_poll must be > 0");
        assert!(!self.join_grace.is_zero(), "join_grace must be > 0");
        if let Some(n) = self.team_size {
            assert!(n >= 1, "team_size must be >= 1");
        }
    }
}

/// A completed, passing run. Aborts and violations return [`GameError`]
/// instead, so a report in hand means the invariant held.
#[derive(Clone, Copy, Debug)]
pub struct GameReport {
    pub team_size: usize,
    /// Sampled at the end of the window; 0 by definition of "passing".
    pub final_ball_pos: u64,
    /// Measured length of the run window.
    pub elapsed: Duration,
}

// ============================================================================
// Entry point
// ============================================================================

/// Runs one full game on `host` and blocks for the verdict.
///
/// Spawns the referee at [`REFEREE_RANK`], which drives all five waves and
/// the timed window; see the module docs for the state machine.
///
/// # Errors
///
/// Any [`GameError`]; [`GameError::InvariantViolation`] is the detection
/// this harness exists for.
///
/// # Panics
///
/// If `config` fails validation.
pub fn run_game(host: Arc<dyn Host>, config: GameConfig) -> Result<GameReport, GameError> {
    config.validate();
    let team_size = config.team_size.unwrap_or_else(|| host.cpu_count()).max(1);

    let (verdict_tx, verdict_rx) = chan::bounded(1);
    let referee_host = Arc::clone(&host);
    let referee = host
        .spawn(
            "referee".into(),
            REFEREE_RANK,
            Box::new(move || {
                let _ = verdict_tx.send(referee_main(&*referee_host, config, team_size));
            }),
        )
        .map_err(|source| GameError::Spawn {
            name: "referee".into(),
            source,
        })?;

    let verdict = verdict_rx.recv().unwrap_or(Err(GameError::RefereeLost));
    let _ = referee.join();
    verdict
}

// ============================================================================
// Referee body
// ============================================================================

fn referee_main(
    host: &dyn Host,
    config: GameConfig,
    team_size: usize,
) -> Result<GameReport, GameError> {
    eprintln!(
        "sched-football: referee started: team_size={team_size} game_time={:?} locks={:?}",
        config.game_time, config.lock_kind
    );

    let ctx = Arc::new(GameCtx::new(team_size, config.lock_kind)?);
    let barrier = CheckinBarrier {
        poll_interval: config.checkin_poll,
        timeout: config.checkin_timeout,
    };

    let mut squad: Vec<JoinHandle<()>> = Vec::with_capacity(team_size * LADDER.len());
    let mut expected = 0usize;

    for role in LADDER {
        expected += team_size;

        if let Err(err) = spawn_wave(host, &ctx, role, team_size, &mut squad) {
            return abort(&ctx, squad, config.join_grace, err);
        }
        if let Err(t) = barrier.wait_for(&ctx, expected) {
            let err = GameError::Checkin {
                role,
                expected: t.expected,
                actual: t.actual,
            };
            return abort(&ctx, squad, config.join_grace, err);
        }
        eprintln!(
            "sched-football: wave checked in: {} x{team_size} (rank {})",
            role.name(),
            role.fifo_rank().rank()
        );
    }

    eprintln!("sched-football: all players checked in, starting game");
    ctx.reset_ball();
    let kickoff = Instant::now();
    thread::sleep(config.game_time);

    // Sampled before the stop latch flips: the reading deliberately covers
    // the tail of the live window, so a violation racing the whistle still
    // counts. A correct run never moves the ball at any point, so the order
    // cannot turn a pass into a failure.
    let final_ball_pos = ctx.ball_pos();
    ctx.end_game();
    let elapsed = kickoff.elapsed();
    eprintln!("sched-football: game over, final ball_pos={final_ball_pos}");

    join_squad(squad, config.join_grace)?;

    if final_ball_pos != 0 {
        return Err(GameError::InvariantViolation { final_ball_pos });
    }
    Ok(GameReport {
        team_size,
        final_ball_pos,
        elapsed,
    })
}

/// Spawns one wave of `team_size` players for `role`.
fn spawn_wave(
    host: &dyn Host,
    ctx: &Arc<GameCtx>,
    role: Role,
    team_size: usize,
    squad: &mut Vec<JoinHandle<()>>,
) -> Result<(), GameError> {
    for slot in 0..team_size {
        let ctx = Arc::clone(ctx);
        let name = format!("{}-{slot}", role.name());
        match host.spawn(
            name.clone(),
            role.fifo_rank(),
            Box::new(move || role.play(&ctx, slot)),
        ) {
            Ok(handle) => squad.push(handle),
            Err(source) => return Err(GameError::Spawn { name, source }),
        }
    }
    Ok(())
}

/// Best-effort STOP on the abort path: latch, join, surface the original
/// failure (a straggler during abort does not mask it).
fn abort(
    ctx: &GameCtx,
    squad: Vec<JoinHandle<()>>,
    grace: Duration,
    err: GameError,
) -> Result<GameReport, GameError> {
    eprintln!("sched-football: aborting run: {err}");
    ctx.end_game();
    if let Err(stragglers) = join_squad(squad, grace) {
        eprintln!("sched-football: while aborting: {stragglers}");
    }
    Err(err)
}

/// Joins every player within `grace`.
///
/// std has no bounded join, so completion is polled; players that outlive
/// the grace are counted, their handles dropped (a blocking join here could
/// hang the harness on the very defect it is reporting), and the run fails
/// with [`GameError::Stragglers`].
fn join_squad(squad: Vec<JoinHandle<()>>, grace: Duration) -> Result<(), GameError> {
    let deadline = Instant::now() + grace;
    let mut pending = squad;

    loop {
        let mut still_running = Vec::new();
        for handle in pending {
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                still_running.push(handle);
            }
        }
        if still_running.is_empty() {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(GameError::Stragglers {
                stalled: still_running.len(),
            });
        }
        pending = still_running;
        thread::sleep(JOIN_POLL);
    }
}

// ============================================================================
// Tests
// ============================================================================
