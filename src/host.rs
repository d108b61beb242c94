//! Host capability layer: RT thread creation and cpu discovery.
//!
//! The harness needs exactly two things from its host: "spawn a named thread
//! pinned to a SCHED_FIFO rank" and "how many processing units are there".
//! Everything else (yield, sleep, the stop flag) is plain std. Keeping the
//! surface this small lets tests substitute a misbehaving host and lets the
//! whole game run without RT privileges via [`FairHost`].
//!
//! # Platform Support
//!
//! - **Linux**: full support via `pthread_setschedparam(SCHED_FIFO)`.
//! - **Other**: [`FifoHost`] returns `Unsupported` (not silently ignored!);
//!   [`FairHost`] works everywhere.
//!
//! # Priority-assignment failure
//!
//! The rank is applied by the spawner, from outside, on the half-started
//! thread. The thread holds at a gate until the rank is in place; if the
//! assignment fails (typically `EPERM` without `CAP_SYS_NICE`), the gate
//! releases with an abort, the thread exits without running its body, and
//! the spawner joins it before surfacing the error. A worker therefore never
//! runs at the wrong priority.

use crossbeam_channel as chan;
use std::io;
use std::thread::{self, JoinHandle};

/// Lowest and highest meaningful SCHED_FIFO ranks.
pub const MIN_FIFO_RANK: u8 = 1;
pub const MAX_FIFO_RANK: u8 = 99;

/// A SCHED_FIFO rank. Higher is more favored.
///
/// Ordering on `Priority` matches scheduling favor, so the role ladder can
/// assert it is strictly ascending.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Priority(u8);

impl Priority {
    /// Creates a rank. Panics outside `MIN_FIFO_RANK..=MAX_FIFO_RANK`.
    pub const fn new(rank: u8) -> Self {
        assert!(rank >= MIN_FIFO_RANK && rank <= MAX_FIFO_RANK);
        Self(rank)
    }

    pub const fn rank(self) -> u8 {
        self.0
    }
}

/// The capability surface the referee consumes.
///
/// Implementations must be cheap to share (`&dyn Host` is passed around
/// freely) and must guarantee that a successfully returned handle runs its
/// body at the requested rank, or at whatever rank the implementation
/// documents ignoring it ([`FairHost`]).
pub trait Host: Send + Sync {
    /// Spawns a named thread at `prio` and returns its handle.
    ///
    /// On error (thread creation or priority assignment) no user code has
    /// run and no thread is left behind.
    fn spawn(
        &self,
        name: String,
        prio: Priority,
        body: Box<dyn FnOnce() + Send>,
    ) -> io::Result<JoinHandle<()>>;

    /// Number of processing units available to this process.
    fn cpu_count(&self) -> usize;
}

/// Number of available CPUs, respecting cgroup limits and affinity masks.
///
/// Falls back to 1 (with a stderr warning) if parallelism cannot be
/// determined; the game degrades to a single slot per tier.
pub fn available_cpus() -> usize {
    match thread::available_parallelism() {
        Ok(n) => n.get(),
        Err(e) => {
            eprintln!("sched-football: WARN: could not determine CPU count ({e}), defaulting to 1");
            1
        }
    }
}

// ============================================================================
// FifoHost
// ============================================================================

/// Real SCHED_FIFO host.
///
/// Requires `CAP_SYS_NICE` (or root) and a platform exposing
/// `pthread_setschedparam`; see the module docs for the failure contract.
#[derive(Clone, Copy, Debug, Default)]
pub struct FifoHost;

impl Host for FifoHost {
    fn spawn(
        &self,
        name: String,
        prio: Priority,
        body: Box<dyn FnOnce() + Send>,
    ) -> io::Result<JoinHandle<()>> {
        let (gate_tx, gate_rx) = chan::bounded::<bool>(1);
        let th = thread::Builder::new().name(name).spawn(move || {
            // Hold until the spawner has applied (or failed to apply) the
            // FIFO rank. A `false` release means abort without running.
            if gate_rx.recv() != Ok(true) {
                return;
            }
            body();
        })?;

        match set_fifo_rank(&th, prio) {
            Ok(()) => {
                let _ = gate_tx.send(true);
                Ok(th)
            }
            Err(e) => {
                let _ = gate_tx.send(false);
                let _ = th.join();
                Err(e)
            }
        }
    }

    fn cpu_count(&self) -> usize {
        available_cpus()
    }
}

#[cfg(target_os = "linux")]
fn set_fifo_rank(th: &JoinHandle<()>, prio: Priority) -> io::Result<()> {
    use std::os::unix::thread::JoinHandleExt;

    let param = libc::sched_param {
        sched_priority: libc::c_int::from(prio.rank()),
    };
    // SAFETY: the pthread_t stays valid for the lifetime of the JoinHandle,
    // and `param` is fully initialized. pthread_setschedparam reports errors
    // via its return code, not errno.
    let rc = unsafe { libc::pthread_setschedparam(th.as_pthread_t(), libc::SCHED_FIFO, &param) };
    if rc != 0 {
        return Err(io::Error::from_raw_os_error(rc));
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn set_fifo_rank(_th: &JoinHandle<()>, _prio: Priority) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "SCHED_FIFO thread priorities are not supported on this platform",
    ))
}

/// Probes whether this process may create SCHED_FIFO threads.
///
/// Spawns and joins one trivial thread at the lowest rank. Used by tests and
/// the CLI to skip the RT path gracefully in unprivileged environments.
pub fn rt_available() -> bool {
    FifoHost
        .spawn(
            "rt-probe".into(),
            Priority::new(MIN_FIFO_RANK),
            Box::new(|| {}),
        )
        .map(|th| th.join().is_ok())
        .unwrap_or(false)
}

// ============================================================================
// FairHost
// ============================================================================

/// Plain-thread host: ranks are accepted but not applied.
///
/// Under a fair scheduler the priority ladder has no teeth, so a game run on
/// this host is expected to *detect* the missing boosting (nonzero ball).
/// That makes it useful twice over: harness plumbing can be exercised
/// without privileges, and the detection path gets a deterministic-enough
/// trigger.
#[derive(Clone, Copy, Debug, Default)]
pub struct FairHost;

impl Host for FairHost {
    fn spawn(
        &self,
        name: String,
        _prio: Priority,
        body: Box<dyn FnOnce() + Send>,
    ) -> io::Result<JoinHandle<()>> {
        thread::Builder::new().name(name).spawn(move || body())
    }

    fn cpu_count(&self) -> usize {
        available_cpus()
    }
}

// ============================================================================
// Tests
// ============================================================================
