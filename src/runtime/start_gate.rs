// src/runtime/start_gate.rs
//! Start gate and simulation epoch
//!
//! Philosopher threads are spawned before the simulation starts and park on
//! the gate. The coordinator opens it once every thread exists, handing out a
//! single epoch all elapsed times are measured from. If spawning fails
//! part-way the gate is aborted instead and never opens.

use once_cell::sync::OnceCell;
use parking_lot::{Condvar, Mutex};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    Closed,
    Open,
    Aborted,
}

/// What a thread waiting on the gate should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Start { epoch_us: u64 },
    Abort,
}

#[derive(Debug)]
pub struct StartGate {
    state: Mutex<GateState>,
    changed: Condvar,
    epoch_us: OnceCell<u64>,
}

impl StartGate {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GateState::Closed),
            changed: Condvar::new(),
            epoch_us: OnceCell::new(),
        }
    }

    /// Block until the gate is opened or aborted
    pub fn wait(&self) -> GateOutcome {
        let mut state = self.state.lock();
        while *state == GateState::Closed {
            self.changed.wait(&mut state);
        }

        match (*state, self.epoch_us.get()) {
            (GateState::Open, Some(&epoch_us)) => GateOutcome::Start { epoch_us },
            _ => GateOutcome::Abort,
        }
    }

    /// Record the epoch and release every waiter
    ///
    /// Returns `false` if the gate was already opened or aborted.
    pub fn open(&self, epoch_us: u64) -> bool {
        let mut state = self.state.lock();
        if *state != GateState::Closed || self.epoch_us.set(epoch_us).is_err() {
            return false;
        }
        *state = GateState::Open;
        self.changed.notify_all();
        debug!("Start gate opened at epoch {}µs", epoch_us);
        true
    }

    /// Release every waiter without starting the simulation
    pub fn abort(&self) -> bool {
        let mut state = self.state.lock();
        if *state != GateState::Closed {
            return false;
        }
        *state = GateState::Aborted;
        self.changed.notify_all();
        debug!("Start gate aborted");
        true
    }

    pub fn is_closed(&self) -> bool {
        *self.state.lock() == GateState::Closed
    }

    /// Epoch, once the gate has been opened
    pub fn epoch_us(&self) -> Option<u64> {
        self.epoch_us.get().copied()
    }
}

impl Default for StartGate {
    fn default() -> Self {
        Self::new()
    }
}
