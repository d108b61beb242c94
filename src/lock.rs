//! Priority-inheriting lock slots and the two-tier lock chain.
//!
//! These are deliberately *not* throughput locks: each slot is acquired once
//! by its long-lived holder and kept for the whole game, purely to construct
//! the inversion the scheduler must resolve. `std::sync::Mutex` cannot be
//! used here because it makes no priority-inheritance promise; the slots go
//! straight to pthread mutexes with `PTHREAD_PRIO_INHERIT` so a blocked
//! waiter boosts the current holder.
//!
//! # Invariants
//!
//! - A slot's pthread object is heap-pinned ([`PiMutex`] boxes its cell), so
//!   moving the owning collection never moves an initialized mutex.
//! - Lock and unlock happen on the same thread (RAII guard, never sent
//!   across threads), as POSIX requires.
//! - [`LockKind::Plain`] builds the same slot without the PI protocol; it
//!   exists so tests can demonstrate the harness catches a non-boosting
//!   lock, and must never be used in a run that is expected to pass.

use std::cell::UnsafeCell;
use std::io;

/// Which mutex protocol a chain is built with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockKind {
    /// `PTHREAD_PRIO_INHERIT`: a blocked waiter boosts the holder. Linux only.
    PriorityInheritance,
    /// Default protocol: no boosting. For demonstrating detection only.
    Plain,
}

// ============================================================================
// PiMutex
// ============================================================================

/// One lock slot.
///
/// Wraps a raw pthread mutex because the priority-inheritance protocol is
/// the entire point; see the module docs. Destroyed on drop.
#[derive(Debug)]
pub struct PiMutex {
    #[cfg(unix)]
    cell: Box<UnsafeCell<libc::pthread_mutex_t>>,
    #[cfg(not(unix))]
    never: std::convert::Infallible,
}

// SAFETY: the pthread mutex provides its own cross-thread exclusion; the
// UnsafeCell is only ever handed to pthread calls.
unsafe impl Send for PiMutex {}
unsafe impl Sync for PiMutex {}

#[cfg(unix)]
impl PiMutex {
    /// Initializes one slot with the requested protocol.
    ///
    /// # Errors
    ///
    /// - `Unsupported` for `PriorityInheritance` off Linux.
    /// - Raw OS errors from `pthread_mutexattr_*` / `pthread_mutex_init`.
    pub fn new(kind: LockKind) -> io::Result<Self> {
        let cell = Box::new(UnsafeCell::new(libc::PTHREAD_MUTEX_INITIALIZER));

        // SAFETY: attr is initialized before use and destroyed on every
        // path; the mutex cell is heap-pinned and zero-state until init.
        unsafe {
            let mut attr: libc::pthread_mutexattr_t = std::mem::zeroed();
            let rc = libc::pthread_mutexattr_init(&mut attr);
            if rc != 0 {
                return Err(io::Error::from_raw_os_error(rc));
            }

            if kind == LockKind::PriorityInheritance {
                #[cfg(target_os = "linux")]
                {
                    let rc =
                        libc::pthread_mutexattr_setprotocol(&mut attr, libc::PTHREAD_PRIO_INHERIT);
                    if rc != 0 {
                        let _ = libc::pthread_mutexattr_destroy(&mut attr);
                        return Err(io::Error::from_raw_os_error(rc));
                    }
                }
                #[cfg(not(target_os = "linux"))]
                {
                    let _ = libc::pthread_mutexattr_destroy(&mut attr);
                    return Err(io::Error::new(
                        io::ErrorKind::Unsupported,
                        "PTHREAD_PRIO_INHERIT is not supported on this platform",
                    ));
                }
            }

            let rc = libc::pthread_mutex_init(cell.get(), &attr);
            let _ = libc::pthread_mutexattr_destroy(&mut attr);
            if rc != 0 {
                return Err(io::Error::from_raw_os_error(rc));
            }
        }

        Ok(Self { cell })
    }

    /// Blocks until the slot is held; returns the releasing guard.
    ///
    /// A nonzero return from `pthread_mutex_lock` on a private, correctly
    /// initialized, non-recursive mutex means the process state is corrupt;
    /// that is a panic, not a recoverable error (same stance std takes on
    /// poisoned mutexes).
    pub fn acquire(&self) -> SlotGuard<'_> {
        // SAFETY: cell points at a mutex initialized by `new`.
        let rc = unsafe { libc::pthread_mutex_lock(self.cell.get()) };
        assert!(
            rc == 0,
            "pthread_mutex_lock: {}",
            io::Error::from_raw_os_error(rc)
        );
        SlotGuard { slot: self }
    }
}

#[cfg(unix)]
impl Drop for PiMutex {
    fn drop(&mut self) {
        // SAFETY: owning &mut proves no guard is outstanding, so the mutex
        // is unlocked and destroyable. Failure here is unreportable.
        let _ = unsafe { libc::pthread_mutex_destroy(self.cell.get()) };
    }
}

#[cfg(not(unix))]
impl PiMutex {
    pub fn new(_kind: LockKind) -> io::Result<Self> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "pthread lock slots are not supported on this platform",
        ))
    }

    pub fn acquire(&self) -> SlotGuard<'_> {
        match self.never {}
    }
}

/// RAII hold on one slot; unlocks on drop, on the acquiring thread.
#[derive(Debug)]
pub struct SlotGuard<'a> {
    slot: &'a PiMutex,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            // SAFETY: the guard's existence proves this thread holds the lock.
            let rc = unsafe { libc::pthread_mutex_unlock(self.slot.cell.get()) };
            debug_assert!(rc == 0, "pthread_mutex_unlock returned {rc}");
        }
        #[cfg(not(unix))]
        match self.slot.never {}
    }
}

// ============================================================================
// LockChain
// ============================================================================

/// One tier of the chain: N slots, slot `i` belonging to worker index `i`.
///
/// Allocated once before any worker spawns; the slots are dropped (and the
/// pthread objects destroyed) with the owning run context, strictly after
/// every worker has been joined.
#[derive(Debug)]
pub struct LockChain {
    slots: Box<[PiMutex]>,
}

impl LockChain {
    pub fn new(len: usize, kind: LockKind) -> io::Result<Self> {
        let mut slots = Vec::with_capacity(len);
        for _ in 0..len {
            slots.push(PiMutex::new(kind)?);
        }
        Ok(Self {
            slots: slots.into_boxed_slice(),
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Blocks until slot `i` is held. Panics if `i` is out of range.
    pub fn acquire(&self, i: usize) -> SlotGuard<'_> {
        self.slots[i].acquire()
    }
}

// ============================================================================
// Tests
// ============================================================================
