// src/runtime/table.rs
//! Shared state of one simulation run
//!
//! The table owns everything the threads share: forks, meal records, the
//! start gate, the termination flag and the event sink. Threads only ever
//! borrow it; it is created by the coordinator during setup and dropped at
//! teardown.

use crate::recording::event_sink::{EventKind, EventSink, LifecycleEvent};
use crate::runtime::agent_state::AgentState;
use crate::runtime::forks::ForkSet;
use crate::runtime::start_gate::StartGate;
use crate::runtime::termination::TerminationFlag;
use crate::utils::clock;
use crate::utils::config::{SimulationConfig, TimingSettings};
use crate::utils::errors::SetupError;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub struct Table {
    config: SimulationConfig,
    timing: TimingSettings,
    forks: ForkSet,
    philosophers: Vec<AgentState>,
    gate: StartGate,
    flag: Arc<TerminationFlag>,
    sink: Arc<dyn EventSink>,
}

impl Table {
    /// Allocate forks and meal records for `config`
    pub fn new(
        config: SimulationConfig,
        timing: TimingSettings,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, SetupError> {
        let count = config.philosophers();
        let forks = ForkSet::new(count)?;

        let mut philosophers = Vec::new();
        philosophers
            .try_reserve_exact(count)
            .map_err(|_| SetupError::Allocation {
                what: "philosopher records",
                count,
            })?;
        philosophers.extend((0..count).map(AgentState::new));

        Ok(Self {
            config,
            timing,
            forks,
            philosophers,
            gate: StartGate::new(),
            flag: Arc::new(TerminationFlag::new()),
            sink,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn timing(&self) -> &TimingSettings {
        &self.timing
    }

    pub fn forks(&self) -> &ForkSet {
        &self.forks
    }

    pub fn philosophers(&self) -> &[AgentState] {
        &self.philosophers
    }

    /// Meal record of philosopher `id`
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a seat at this table.
    pub fn philosopher(&self, id: usize) -> &AgentState {
        &self.philosophers[id]
    }

    pub fn gate(&self) -> &StartGate {
        &self.gate
    }

    pub fn flag(&self) -> &TerminationFlag {
        &self.flag
    }

    pub(crate) fn shared_flag(&self) -> Arc<TerminationFlag> {
        Arc::clone(&self.flag)
    }

    /// The one "should I stop" check every suspend point uses
    pub fn should_stop(&self) -> bool {
        self.flag.is_set()
    }

    /// Record the epoch as every philosopher's last meal, then open the gate
    pub fn start(&self) -> u64 {
        let epoch_us = clock::now_us();
        for philosopher in &self.philosophers {
            philosopher.start_meal(epoch_us);
        }
        self.gate.open(epoch_us);
        epoch_us
    }

    /// Microseconds since the epoch (0 before the gate opens)
    pub fn elapsed_us(&self) -> u64 {
        self.gate
            .epoch_us()
            .map_or(0, |epoch| clock::now_us().saturating_sub(epoch))
    }

    /// Emit an event unless the simulation is already over
    ///
    /// The timestamp is taken inside the flag's critical section, so events
    /// reach the sink in timestamp order.
    pub fn report(&self, philosopher: usize, kind: EventKind) -> bool {
        self.flag
            .while_running(|| {
                self.sink.emit(&LifecycleEvent {
                    elapsed_us: self.elapsed_us(),
                    philosopher,
                    kind,
                });
            })
            .is_some()
    }

    /// Emit "died" and end the simulation in one critical section
    ///
    /// Returns the elapsed time of the death, or `None` if the simulation had
    /// already ended.
    pub fn report_death(&self, philosopher: usize) -> Option<u64> {
        let mut at_us = None;
        self.flag.finish_with(|| {
            let elapsed_us = self.elapsed_us();
            self.sink.emit(&LifecycleEvent {
                elapsed_us,
                philosopher,
                kind: EventKind::Died,
            });
            at_us = Some(elapsed_us);
        });
        at_us
    }

    /// Sleep for `duration`, waking every nap slice to check the flag
    ///
    /// Returns `false` if the nap was cut short by termination.
    pub fn nap(&self, duration: Duration) -> bool {
        let total_us = clock::micros(duration);
        let slice = self.timing.nap_slice();
        let start_us = clock::now_us();

        loop {
            if self.should_stop() {
                return false;
            }
            let slept_us = clock::now_us().saturating_sub(start_us);
            if slept_us >= total_us {
                return true;
            }
            let remaining = Duration::from_micros(total_us - slept_us);
            thread::sleep(remaining.min(slice));
        }
    }
}
