// src/runtime/philosopher.rs
//! Philosopher lifecycle
//!
//! Each philosopher runs on its own thread:
//!
//! ```text
//! WaitingAtGate → Thinking → AcquiringFirstFork → AcquiringSecondFork
//!       → Eating → Releasing → Sleeping → Thinking → ... → Terminated
//! ```
//!
//! # Deadlock mitigation
//!
//! Every philosopher takes its own fork first and the borrowed one second.
//! Around a ring that order alone can deadlock (everyone holding their own
//! fork, waiting on the next). The only tie-break is a staggered start:
//! even-numbered philosophers delay their first cycle by a tenth of the eat
//! time. This makes the all-hold-first-fork interleaving unlikely, not
//! impossible; adversarial scheduling can still deadlock the table.

use crate::recording::event_sink::EventKind;
use crate::runtime::start_gate::GateOutcome;
use crate::runtime::table::Table;
use crate::utils::clock;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    WaitingAtGate,
    Thinking,
    AcquiringFirstFork,
    AcquiringSecondFork,
    Eating,
    Releasing,
    Sleeping,
    Terminated,
}

/// How a philosopher thread ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// The gate was aborted before the simulation started
    NeverSeated,

    /// Alone at the table with a single fork
    Alone,

    /// Saw the termination flag
    Stopped,
}

/// Summary returned by a philosopher thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhilosopherSummary {
    pub id: usize,
    pub meals: u64,
    pub departure: Departure,
}

pub struct Philosopher<'t> {
    id: usize,
    table: &'t Table,
    state: LifecycleState,
}

impl<'t> Philosopher<'t> {
    pub fn new(id: usize, table: &'t Table) -> Self {
        Self {
            id,
            table,
            state: LifecycleState::WaitingAtGate,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Run the philosopher until the simulation ends
    pub fn run(mut self) -> PhilosopherSummary {
        match self.table.gate().wait() {
            GateOutcome::Start { epoch_us } => {
                debug!("Philosopher {} seated at epoch {}µs", self.id + 1, epoch_us);
            }
            GateOutcome::Abort => return self.depart(Departure::NeverSeated),
        }

        self.transition(LifecycleState::Thinking);
        self.table.report(self.id, EventKind::Thinking);

        if self.id % 2 == 0 {
            let divisor = self.table.timing().stagger_divisor;
            let stagger = self.table.config().time_to_eat().checked_div(divisor);
            self.table.nap(stagger.unwrap_or_default());
        }

        if self.table.forks().len() == 1 {
            self.sit_alone();
            return self.depart(Departure::Alone);
        }

        while !self.table.should_stop() {
            self.dine();
        }

        self.depart(Departure::Stopped)
    }

    /// One full eat → sleep → think cycle
    fn dine(&mut self) {
        let table = self.table;
        let forks = table.forks();
        let record = table.philosopher(self.id);

        self.transition(LifecycleState::AcquiringFirstFork);
        let first = forks.acquire(forks.own(self.id));
        table.report(self.id, EventKind::TookFork);

        self.transition(LifecycleState::AcquiringSecondFork);
        let second = forks.acquire(forks.borrowed(self.id));
        table.report(self.id, EventKind::TookFork);

        self.transition(LifecycleState::Eating);
        record.start_meal(clock::now_us());
        table.report(self.id, EventKind::Eating);
        table.nap(table.config().time_to_eat());

        self.transition(LifecycleState::Releasing);
        second.release();
        first.release();
        let meals = record.finish_meal();
        metrics::counter!("philo_meals_total").increment(1);
        trace!("Philosopher {} finished meal {}", self.id + 1, meals);

        self.transition(LifecycleState::Sleeping);
        table.report(self.id, EventKind::Sleeping);
        table.nap(table.config().time_to_sleep());

        self.transition(LifecycleState::Thinking);
        table.report(self.id, EventKind::Thinking);
    }

    /// A lone philosopher holds its only fork and can never eat
    fn sit_alone(&mut self) {
        let table = self.table;

        self.transition(LifecycleState::AcquiringFirstFork);
        let only = table.forks().acquire(table.forks().own(self.id));
        table.report(self.id, EventKind::TookFork);
        only.release();
    }

    fn depart(&mut self, departure: Departure) -> PhilosopherSummary {
        self.transition(LifecycleState::Terminated);
        let meals = self.table.philosopher(self.id).meals();
        debug!(
            "Philosopher {} left the table ({:?}) after {} meals",
            self.id + 1,
            departure,
            meals
        );

        PhilosopherSummary {
            id: self.id,
            meals,
            departure,
        }
    }

    fn transition(&mut self, next: LifecycleState) {
        trace!("Philosopher {}: {:?} → {:?}", self.id + 1, self.state, next);
        self.state = next;
    }
}
