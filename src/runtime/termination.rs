// src/runtime/termination.rs
//! Global "simulation over" flag
//!
//! A single guarded boolean. The monitor is the only writer during a normal
//! run; the coordinator forces it when a run has to be abandoned. Once set it
//! is never cleared.
//!
//! Event reporting happens inside the flag's critical section, which is what
//! makes the "no output after the end" rule race-free.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

#[derive(Debug, Default)]
pub struct TerminationFlag {
    stopped: Mutex<bool>,

    /// Number of false → true transitions (at most one)
    transitions: AtomicUsize,
}

impl TerminationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        *self.stopped.lock()
    }

    /// Set the flag. Returns `true` if this call flipped it.
    pub fn set(&self) -> bool {
        self.finish_with(|| ())
    }

    /// Run `f` under the lock, only while the flag is still clear
    ///
    /// Returns `Some` with the result of `f`, or `None` if the simulation is
    /// already over.
    pub fn while_running<T>(&self, f: impl FnOnce() -> T) -> Option<T> {
        let stopped = self.stopped.lock();
        if *stopped {
            return None;
        }
        Some(f())
    }

    /// Run `f` and set the flag in one critical section
    ///
    /// Nothing can be reported between `f` and the flag becoming true. If the
    /// flag is already set, `f` is not run and `false` is returned.
    pub fn finish_with(&self, f: impl FnOnce()) -> bool {
        let mut stopped = self.stopped.lock();
        if *stopped {
            return false;
        }
        f();
        *stopped = true;
        self.transitions.fetch_add(1, Ordering::AcqRel);
        debug!("Termination flag set");
        true
    }

    pub fn transitions(&self) -> usize {
        self.transitions.load(Ordering::Acquire)
    }
}
