// src/runtime/monitor.rs
//! Starvation and satisfaction monitor
//!
//! Runs on its own thread, polling every philosopher's meal record. It only
//! reads records (each under its own lock) and is the only thread that ends
//! a normal run.

use crate::runtime::table::Table;
use crate::utils::clock;
use std::thread;
use tracing::{debug, info};

/// Why the monitor stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorOutcome {
    /// A philosopher went `time_to_die` without starting a meal
    Starved { philosopher: usize, at_us: u64 },

    /// Every philosopher reached the required meal count
    Satisfied,

    /// The simulation was ended by someone else
    Stopped,
}

impl MonitorOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            MonitorOutcome::Starved { .. } => "starved",
            MonitorOutcome::Satisfied => "satisfied",
            MonitorOutcome::Stopped => "stopped",
        }
    }
}

pub struct Monitor<'t> {
    table: &'t Table,
}

impl<'t> Monitor<'t> {
    pub fn new(table: &'t Table) -> Self {
        Self { table }
    }

    /// Poll until the simulation ends
    pub fn run(self) -> MonitorOutcome {
        let poll = self.table.timing().monitor_poll();
        debug!("Monitor polling every {:?}", poll);

        loop {
            if let Some(outcome) = self.check() {
                info!("Monitor finished: {:?}", outcome);
                return outcome;
            }
            thread::sleep(poll);
        }
    }

    /// One poll. Returns the outcome if the simulation is over.
    pub fn check(&self) -> Option<MonitorOutcome> {
        if self.table.should_stop() {
            return Some(MonitorOutcome::Stopped);
        }

        if let Some(philosopher) = self.find_starving() {
            return Some(match self.table.report_death(philosopher) {
                Some(at_us) => {
                    metrics::counter!("philo_deaths_total").increment(1);
                    MonitorOutcome::Starved { philosopher, at_us }
                }
                None => MonitorOutcome::Stopped,
            });
        }

        if self.everyone_fed() {
            return Some(if self.table.flag().set() {
                MonitorOutcome::Satisfied
            } else {
                MonitorOutcome::Stopped
            });
        }

        None
    }

    /// First philosopher, by id, past its death timeout
    fn find_starving(&self) -> Option<usize> {
        let time_to_die_us = clock::micros(self.table.config().time_to_die());

        self.table.philosophers().iter().find_map(|philosopher| {
            let now_us = clock::now_us();
            let last_meal_us = philosopher.last_meal_us();
            (now_us.saturating_sub(last_meal_us) >= time_to_die_us).then(|| philosopher.id())
        })
    }

    /// Whether every philosopher has eaten the required number of meals
    fn everyone_fed(&self) -> bool {
        match self.table.config().required_meals() {
            Some(required) => self
                .table
                .philosophers()
                .iter()
                .all(|philosopher| philosopher.meals() >= required),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::event_sink::{EventKind, RecordingSink};
    use crate::utils::config::{SimulationConfig, TimingSettings};
    use std::sync::Arc;
    use std::time::Duration;

    fn table(n: usize, die: u64, meals: Option<u64>, sink: Arc<RecordingSink>) -> Table {
        let config = SimulationConfig::from_millis(n, die, 10, 10, meals).unwrap();
        Table::new(config, TimingSettings::default(), sink).unwrap()
    }

    #[test]
    fn test_nothing_to_report() {
        let t = table(3, 10_000, None, Arc::new(RecordingSink::new()));
        t.start();
        assert_eq!(Monitor::new(&t).check(), None);
        assert!(!t.should_stop());
    }

    #[test]
    fn test_detects_starvation_in_id_order() {
        let sink = Arc::new(RecordingSink::new());
        let t = table(3, 20, None, Arc::clone(&sink));
        t.start();
        thread::sleep(Duration::from_millis(25));

        // Philosopher 0 just ate, so 1 is the first starving one.
        t.philosopher(0).start_meal(clock::now_us());

        let outcome = Monitor::new(&t).check();
        assert!(matches!(
            outcome,
            Some(MonitorOutcome::Starved { philosopher: 1, at_us }) if at_us >= 20_000
        ));
        assert!(t.should_stop());

        let events = sink.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Died);
        assert_eq!(events[0].philosopher, 1);
    }

    #[test]
    fn test_detects_satisfaction_without_event() {
        let sink = Arc::new(RecordingSink::new());
        let t = table(2, 10_000, Some(2), Arc::clone(&sink));
        t.start();

        for p in t.philosophers() {
            p.finish_meal();
        }
        assert_eq!(Monitor::new(&t).check(), None);

        for p in t.philosophers() {
            p.finish_meal();
        }
        assert_eq!(Monitor::new(&t).check(), Some(MonitorOutcome::Satisfied));
        assert!(t.should_stop());
        assert!(sink.drain().is_empty());
    }

    #[test]
    fn test_unbounded_meals_never_satisfied() {
        let t = table(2, 10_000, None, Arc::new(RecordingSink::new()));
        t.start();
        for p in t.philosophers() {
            for _ in 0..100 {
                p.finish_meal();
            }
        }
        assert_eq!(Monitor::new(&t).check(), None);
    }

    #[test]
    fn test_stopped_externally() {
        let sink = Arc::new(RecordingSink::new());
        let t = table(2, 1, None, Arc::clone(&sink));
        t.start();
        t.flag().set();
        thread::sleep(Duration::from_millis(5));

        assert_eq!(Monitor::new(&t).run(), MonitorOutcome::Stopped);
        assert!(sink.drain().is_empty());
    }

    #[test]
    fn test_run_reports_death_within_a_poll() {
        let sink = Arc::new(RecordingSink::new());
        let t = table(2, 30, None, Arc::clone(&sink));
        t.start();

        match Monitor::new(&t).run() {
            MonitorOutcome::Starved { philosopher, at_us } => {
                assert_eq!(philosopher, 0);
                assert!(at_us >= 30_000);
                assert!(at_us < 30_000 + 5_000, "detected late: {}µs", at_us);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }
}
