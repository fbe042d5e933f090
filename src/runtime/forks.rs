// src/runtime/forks.rs
//! The ring of forks shared by the philosophers
//!
//! Fork `i` is owned by philosopher `i` and borrowed by philosopher
//! `i - 1 (mod N)`. Holding a fork is represented by a [`ForkGuard`];
//! dropping the guard releases the fork.
//!
//! Every fork counts its current holders and remembers the highest count it
//! ever saw, so exclusivity (`held ∈ {0, 1}`) can be checked after a run.

use crate::utils::errors::SetupError;
use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::trace;

/// One exclusive fork
#[derive(Debug, Default)]
pub struct Fork {
    lock: Mutex<()>,

    /// Threads currently holding the fork
    holders: AtomicUsize,

    /// Highest `holders` value ever observed
    max_holders: AtomicUsize,

    /// Total successful acquisitions
    acquisitions: AtomicU64,
}

/// Exclusive hold on one fork, released on drop
#[must_use = "dropping the guard releases the fork immediately"]
pub struct ForkGuard<'a> {
    id: usize,
    fork: &'a Fork,
    _lock: MutexGuard<'a, ()>,
}

impl ForkGuard<'_> {
    /// Release the fork explicitly
    pub fn release(self) {}
}

impl Drop for ForkGuard<'_> {
    fn drop(&mut self) {
        // Runs before `_lock` is dropped, so the count falls while still exclusive.
        self.fork.holders.fetch_sub(1, Ordering::AcqRel);
        trace!("Released fork {}", self.id);
    }
}

/// All forks on the table, indexed by owner
#[derive(Debug)]
pub struct ForkSet {
    forks: Vec<Fork>,
}

impl ForkSet {
    /// Allocate `count` forks
    pub fn new(count: usize) -> Result<Self, SetupError> {
        let mut forks = Vec::new();
        forks
            .try_reserve_exact(count)
            .map_err(|_| SetupError::Allocation {
                what: "forks",
                count,
            })?;
        forks.extend((0..count).map(|_| Fork::default()));

        Ok(Self { forks })
    }

    pub fn len(&self) -> usize {
        self.forks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forks.is_empty()
    }

    /// Fork owned by `philosopher`
    pub fn own(&self, philosopher: usize) -> usize {
        philosopher
    }

    /// Fork `philosopher` borrows from its neighbour
    pub fn borrowed(&self, philosopher: usize) -> usize {
        (philosopher + 1) % self.forks.len()
    }

    /// Block until fork `id` is held by the caller
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range, as do [`holders`](Self::holders) and
    /// [`acquisitions`](Self::acquisitions).
    pub fn acquire(&self, id: usize) -> ForkGuard<'_> {
        let fork = &self.forks[id];
        let lock = fork.lock.lock();

        let holders = fork.holders.fetch_add(1, Ordering::AcqRel) + 1;
        fork.max_holders.fetch_max(holders, Ordering::AcqRel);
        fork.acquisitions.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("philo_forks_acquired_total").increment(1);
        trace!("Acquired fork {}", id);

        ForkGuard {
            id,
            fork,
            _lock: lock,
        }
    }

    /// Current holder count of fork `id`
    pub fn holders(&self, id: usize) -> usize {
        self.forks[id].holders.load(Ordering::Acquire)
    }

    /// Highest holder count any fork ever reached
    pub fn max_holders(&self) -> usize {
        self.forks
            .iter()
            .map(|f| f.max_holders.load(Ordering::Acquire))
            .max()
            .unwrap_or(0)
    }

    /// Times fork `id` has been acquired
    pub fn acquisitions(&self, id: usize) -> u64 {
        self.forks[id].acquisitions.load(Ordering::Relaxed)
    }

    /// Acquisitions summed over every fork
    pub fn total_acquisitions(&self) -> u64 {
        self.forks
            .iter()
            .map(|f| f.acquisitions.load(Ordering::Relaxed))
            .sum()
    }
}
