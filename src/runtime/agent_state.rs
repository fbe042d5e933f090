// src/runtime/agent_state.rs
//! Per-philosopher meal record
//!
//! Written only by the philosopher's own thread, read by the monitor. Each
//! record has its own lock so the monitor never contends on a table-wide one.

use parking_lot::Mutex;

#[derive(Debug, Default)]
struct MealRecord {
    /// Clock timestamp (µs) of the last meal start, or the epoch before the first
    last_meal_us: u64,

    /// Completed meals
    meals: u64,
}

/// Mutable state of one philosopher
#[derive(Debug)]
pub struct AgentState {
    id: usize,
    record: Mutex<MealRecord>,
}

impl AgentState {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            record: Mutex::new(MealRecord::default()),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Record the start of a meal. Timestamps never move backwards.
    pub fn start_meal(&self, now_us: u64) {
        let mut record = self.record.lock();
        record.last_meal_us = record.last_meal_us.max(now_us);
    }

    /// Count a completed meal and return the new total
    pub fn finish_meal(&self) -> u64 {
        let mut record = self.record.lock();
        record.meals += 1;
        record.meals
    }

    pub fn last_meal_us(&self) -> u64 {
        self.record.lock().last_meal_us
    }

    pub fn meals(&self) -> u64 {
        self.record.lock().meals
    }
}
