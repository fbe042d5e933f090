// src/runtime/coordinator.rs
//! Simulation coordinator
//!
//! Owns the table and drives one run:
//!
//! ```text
//! setup()    allocate forks + meal records
//! run()      spawn N philosophers (parked on the gate)
//!            → epoch → open gate → spawn monitor
//!            → join monitor → join every philosopher
//! teardown() release the table (once)
//! ```
//!
//! Threads are scoped to `run()`, so none can outlive the table. Every join
//! is attempted even after an earlier one failed, and a failed spawn aborts
//! the gate and forces termination so that already-spawned philosophers exit
//! and can be joined.

use crate::recording::event_sink::EventSink;
use crate::runtime::monitor::{Monitor, MonitorOutcome};
use crate::runtime::philosopher::{Departure, Philosopher, PhilosopherSummary};
use crate::runtime::table::Table;
use crate::runtime::termination::TerminationFlag;
use crate::utils::config::{SimulationConfig, TimingSettings};
use crate::utils::errors::{JoinFailure, RunError, SetupError};
use std::any::Any;
use std::io;
use std::sync::Arc;
use std::thread::{self, Scope, ScopedJoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Result of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: MonitorOutcome,

    /// Final meal count per philosopher, by id
    pub meals: Vec<u64>,

    /// How each philosopher left the table, by id
    pub departures: Vec<Departure>,

    /// Wall-clock time from gate opening to the last join
    pub elapsed: Duration,

    /// How many times the termination flag flipped (always 1)
    pub flag_transitions: usize,

    /// Highest number of simultaneous holders any fork had
    pub max_fork_holders: usize,
}

/// What teardown released
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeardownReport {
    pub forks: usize,
    pub philosophers: usize,
}

/// Ends a running simulation from outside the engine
#[derive(Clone)]
pub struct StopHandle {
    flag: Arc<TerminationFlag>,
}

impl StopHandle {
    /// Set the termination flag. Returns `false` if it was already set.
    pub fn stop(&self) -> bool {
        self.flag.set()
    }

    pub fn is_stopped(&self) -> bool {
        self.flag.is_set()
    }
}

type Handles<'scope> = Vec<(String, ScopedJoinHandle<'scope, PhilosopherSummary>)>;

/// Monitor outcome plus every philosopher's summary, by id
type Joined = (MonitorOutcome, Vec<PhilosopherSummary>);

pub struct Coordinator {
    table: Option<Table>,

    /// Refuse to spawn philosophers from this index on
    spawn_limit: Option<usize>,
}

impl Coordinator {
    /// Allocate everything a run needs
    pub fn setup(
        config: SimulationConfig,
        timing: TimingSettings,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, SetupError> {
        info!(
            "Setting up table for {} philosophers (die {:?}, eat {:?}, sleep {:?}, meals {:?})",
            config.philosophers(),
            config.time_to_die(),
            config.time_to_eat(),
            config.time_to_sleep(),
            config.required_meals()
        );

        let table = Table::new(config, timing, sink)?;

        Ok(Self {
            table: Some(table),
            spawn_limit: None,
        })
    }

    /// Fail every philosopher spawn from index `limit` on
    #[cfg(test)]
    fn with_spawn_limit(mut self, limit: usize) -> Self {
        self.spawn_limit = Some(limit);
        self
    }

    /// Table of the current run, until teardown
    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    pub fn stop_handle(&self) -> Option<StopHandle> {
        self.table.as_ref().map(|table| StopHandle {
            flag: table.shared_flag(),
        })
    }

    /// Run the simulation to completion
    pub fn run(&mut self) -> Result<RunReport, RunError> {
        let table = self.table.as_ref().ok_or(RunError::TornDown)?;
        if !table.gate().is_closed() {
            return Err(RunError::AlreadyRan);
        }
        let spawn_limit = self.spawn_limit;
        let count = table.philosophers().len();

        let joined = thread::scope(|scope| -> Result<Joined, RunError> {
            let mut philosophers: Handles<'_> = Vec::with_capacity(count);

            for id in 0..count {
                let name = format!("philosopher-{}", id + 1);
                match spawn_philosopher(scope, table, id, &name, spawn_limit) {
                    Ok(handle) => {
                        debug!("Spawned {}", name);
                        philosophers.push((name, handle));
                    }
                    Err(source) => {
                        error!("Failed to create {} thread: {}", name, source);
                        table.gate().abort();
                        table.flag().set();
                        let (_, join_failures) = join_philosophers(philosophers);
                        return Err(RunError::ThreadSpawn {
                            thread: name,
                            source,
                            join_failures,
                        });
                    }
                }
            }

            let epoch_us = table.start();
            info!("Simulation started at epoch {}µs", epoch_us);

            let monitor = thread::Builder::new()
                .name("monitor".to_string())
                .spawn_scoped(scope, move || Monitor::new(table).run());

            let monitor = match monitor {
                Ok(handle) => handle,
                Err(source) => {
                    error!("Failed to create monitor thread: {}", source);
                    table.flag().set();
                    let (_, join_failures) = join_philosophers(philosophers);
                    return Err(RunError::ThreadSpawn {
                        thread: "monitor".to_string(),
                        source,
                        join_failures,
                    });
                }
            };

            let mut failures = Vec::new();
            let outcome = match monitor.join() {
                Ok(outcome) => Some(outcome),
                Err(payload) => {
                    let failure = join_failure("monitor", payload);
                    warn!("Failed to join {}", failure);
                    // Philosophers only exit once the flag is set.
                    table.flag().set();
                    failures.push(failure);
                    None
                }
            };

            let (summaries, philosopher_failures) = join_philosophers(philosophers);
            failures.extend(philosopher_failures);

            match outcome {
                Some(outcome) if failures.is_empty() => Ok((outcome, summaries)),
                _ => Err(RunError::Join(failures)),
            }
        });

        let elapsed = table
            .gate()
            .epoch_us()
            .map_or(Duration::ZERO, |_| Duration::from_micros(table.elapsed_us()));

        let (outcome, summaries) = match joined {
            Ok(joined) => joined,
            Err(e) => {
                metrics::counter!("philo_runs_total", "outcome" => "failed").increment(1);
                return Err(e);
            }
        };
        metrics::counter!("philo_runs_total", "outcome" => outcome.label()).increment(1);

        let report = RunReport {
            outcome,
            meals: summaries.iter().map(|s| s.meals).collect(),
            departures: summaries.iter().map(|s| s.departure).collect(),
            elapsed,
            flag_transitions: table.flag().transitions(),
            max_fork_holders: table.forks().max_holders(),
        };
        info!(
            "Simulation ended ({}) after {:?}, meals {:?}",
            outcome.label(),
            report.elapsed,
            report.meals
        );

        Ok(report)
    }

    /// Release the table. Only the first call releases anything.
    pub fn teardown(&mut self) -> Option<TeardownReport> {
        let table = self.table.take()?;
        let report = TeardownReport {
            forks: table.forks().len(),
            philosophers: table.philosophers().len(),
        };
        drop(table);

        debug!(
            "Released {} forks and {} philosopher records",
            report.forks, report.philosophers
        );
        Some(report)
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn spawn_philosopher<'scope, 'env>(
    scope: &'scope Scope<'scope, 'env>,
    table: &'env Table,
    id: usize,
    name: &str,
    spawn_limit: Option<usize>,
) -> io::Result<ScopedJoinHandle<'scope, PhilosopherSummary>> {
    if spawn_limit.is_some_and(|limit| id >= limit) {
        return Err(io::Error::new(
            io::ErrorKind::WouldBlock,
            "philosopher spawn limit reached",
        ));
    }

    thread::Builder::new()
        .name(name.to_string())
        .spawn_scoped(scope, move || Philosopher::new(id, table).run())
}

/// Join every philosopher, collecting failures instead of stopping at one
///
/// Summaries come back in spawn order, which is id order.
fn join_philosophers(handles: Handles<'_>) -> (Vec<PhilosopherSummary>, Vec<JoinFailure>) {
    let mut summaries = Vec::with_capacity(handles.len());
    let mut failures = Vec::new();

    for (name, handle) in handles {
        match handle.join() {
            Ok(summary) => {
                debug!("Joined {} ({:?})", name, summary.departure);
                summaries.push(summary);
            }
            Err(payload) => {
                let failure = join_failure(&name, payload);
                warn!("Failed to join {}", failure);
                failures.push(failure);
            }
        }
    }

    (summaries, failures)
}

fn join_failure(thread: &str, payload: Box<dyn Any + Send>) -> JoinFailure {
    let reason = if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "thread panicked".to_string()
    };

    JoinFailure {
        thread: thread.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::event_sink::{EventKind, EventSink, LifecycleEvent, RecordingSink};
    use std::time::Instant;

    /// Records events, but panics on the ones `rejects` matches
    struct FaultySink {
        inner: RecordingSink,
        rejects: fn(&LifecycleEvent) -> bool,
    }

    impl FaultySink {
        fn new(rejects: fn(&LifecycleEvent) -> bool) -> Self {
            Self {
                inner: RecordingSink::new(),
                rejects,
            }
        }
    }

    impl EventSink for FaultySink {
        fn emit(&self, event: &LifecycleEvent) {
            if (self.rejects)(event) {
                panic!("sink rejected event");
            }
            self.inner.emit(event);
        }
    }

    fn setup(config: SimulationConfig, sink: Arc<RecordingSink>) -> Coordinator {
        Coordinator::setup(config, TimingSettings::default(), sink).unwrap()
    }

    fn setup_faulty(config: SimulationConfig, sink: &Arc<FaultySink>) -> Coordinator {
        Coordinator::setup(config, TimingSettings::default(), sink.clone()).unwrap()
    }

    fn kinds(events: &[LifecycleEvent]) -> Vec<EventKind> {
        events.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_satisfaction_run() {
        let sink = Arc::new(RecordingSink::new());
        let config = SimulationConfig::from_millis(3, 800, 20, 20, Some(3)).unwrap();
        let mut coordinator = setup(config, Arc::clone(&sink));

        let report = coordinator.run().unwrap();
        assert_eq!(report.outcome, MonitorOutcome::Satisfied);
        assert_eq!(report.meals.len(), 3);
        assert!(report.meals.iter().all(|&m| m >= 3), "{:?}", report.meals);
        assert_eq!(report.departures, vec![Departure::Stopped; 3]);
        assert_eq!(report.flag_transitions, 1);
        assert_eq!(report.max_fork_holders, 1);

        let events = sink.drain();
        assert!(!kinds(&events).contains(&EventKind::Died));
        for id in 0..3 {
            let eaten = events
                .iter()
                .filter(|e| e.philosopher == id && e.kind == EventKind::Eating)
                .count();
            assert!(eaten >= 3);
        }
    }

    #[test]
    fn test_five_philosophers_meal_limit() {
        let sink = Arc::new(RecordingSink::new());
        // Two of five can eat at once, so meal starts are at least 500ms apart.
        let config = SimulationConfig::from_millis(5, 800, 200, 200, Some(3)).unwrap();
        let mut coordinator = setup(config, Arc::clone(&sink));

        let started = Instant::now();
        let report = coordinator.run().unwrap();

        assert_eq!(report.outcome, MonitorOutcome::Satisfied);
        assert!(report.meals.iter().all(|&m| m >= 3));
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(!kinds(&sink.drain()).contains(&EventKind::Died));
    }

    #[test]
    fn test_lone_philosopher_dies_without_eating() {
        let sink = Arc::new(RecordingSink::new());
        let config = SimulationConfig::from_millis(1, 50, 20, 20, None).unwrap();
        let mut coordinator = setup(config, Arc::clone(&sink));

        let report = coordinator.run().unwrap();
        assert!(matches!(
            report.outcome,
            MonitorOutcome::Starved { philosopher: 0, .. }
        ));
        assert_eq!(report.meals, vec![0]);
        assert_eq!(report.departures, vec![Departure::Alone]);

        let events = sink.drain();
        assert_eq!(
            kinds(&events),
            vec![EventKind::Thinking, EventKind::TookFork, EventKind::Died]
        );
        assert_eq!(coordinator.table().unwrap().forks().acquisitions(0), 1);
    }

    #[test]
    fn test_starvation_is_last_word() {
        let sink = Arc::new(RecordingSink::new());
        // Eating outlasts the death timeout, so someone must starve.
        let config = SimulationConfig::from_millis(3, 60, 200, 50, None).unwrap();
        let mut coordinator = setup(config, Arc::clone(&sink));

        let report = coordinator.run().unwrap();
        let at_us = match report.outcome {
            MonitorOutcome::Starved { at_us, .. } => at_us,
            other => panic!("unexpected outcome {:?}", other),
        };
        assert!(at_us >= 60_000);
        assert!(at_us < 60_000 + 5_000, "detected late: {}µs", at_us);

        let events = sink.drain();
        let last = events.last().unwrap();
        assert_eq!(last.kind, EventKind::Died);
        assert_eq!(
            events.iter().filter(|e| e.kind == EventKind::Died).count(),
            1
        );
        assert!(events.windows(2).all(|w| w[0].elapsed_us <= w[1].elapsed_us));
    }

    #[test]
    fn test_four_philosophers_survive_until_stopped() {
        let sink = Arc::new(RecordingSink::new());
        let config = SimulationConfig::from_millis(4, 800, 200, 200, None).unwrap();
        let mut coordinator = setup(config, Arc::clone(&sink));
        let stop = coordinator.stop_handle().unwrap();

        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(1_500));
            stop.stop()
        });

        let report = coordinator.run().unwrap();
        assert!(stopper.join().unwrap());
        assert_eq!(report.outcome, MonitorOutcome::Stopped);
        assert_eq!(report.flag_transitions, 1);
        assert_eq!(report.max_fork_holders, 1);
        assert!(report.meals.iter().all(|&m| m >= 1), "{:?}", report.meals);
        assert!(!kinds(&sink.drain()).contains(&EventKind::Died));
    }

    #[test]
    fn test_spawn_failure_joins_spawned_threads() {
        let sink = Arc::new(RecordingSink::new());
        let config = SimulationConfig::from_millis(4, 100, 10, 10, None).unwrap();
        let mut coordinator = setup(config, Arc::clone(&sink)).with_spawn_limit(2);

        match coordinator.run() {
            Err(RunError::ThreadSpawn {
                thread,
                join_failures,
                ..
            }) => {
                assert_eq!(thread, "philosopher-3");
                assert!(join_failures.is_empty());
            }
            other => panic!("unexpected result {:?}", other.map(|r| r.outcome)),
        }

        let table = coordinator.table().unwrap();
        assert!(table.should_stop());
        assert_eq!(table.gate().epoch_us(), None);
        assert_eq!(table.forks().total_acquisitions(), 0);
        assert!(sink.drain().is_empty());
    }

    #[test]
    fn test_philosopher_panic_joins_the_rest() {
        // Philosopher 2 panics on its first fork and later starves.
        let sink = Arc::new(FaultySink::new(|e| {
            e.philosopher == 1 && e.kind == EventKind::TookFork
        }));
        let config = SimulationConfig::from_millis(4, 300, 50, 50, None).unwrap();
        let mut coordinator = setup_faulty(config, &sink);

        let started = Instant::now();
        match coordinator.run() {
            Err(RunError::Join(failures)) => {
                assert_eq!(
                    failures,
                    vec![JoinFailure {
                        thread: "philosopher-2".to_string(),
                        reason: "sink rejected event".to_string(),
                    }]
                );
            }
            other => panic!("unexpected result {:?}", other.map(|r| r.outcome)),
        }
        assert!(started.elapsed() < Duration::from_secs(10));

        let table = coordinator.table().unwrap();
        assert!(table.should_stop());
        assert_eq!(table.flag().transitions(), 1);
        assert_eq!(table.forks().max_holders(), 1);
        assert!((0..4).all(|id| table.forks().holders(id) == 0));

        let last = *sink.inner.drain().last().unwrap();
        assert_eq!(last.kind, EventKind::Died);
        assert_eq!(last.philosopher, 1);
    }

    #[test]
    fn test_monitor_panic_joins_philosophers() {
        let sink = Arc::new(FaultySink::new(|e| e.kind == EventKind::Died));
        // Eating outlasts the death timeout, so the monitor reports a death.
        let config = SimulationConfig::from_millis(3, 60, 200, 50, None).unwrap();
        let mut coordinator = setup_faulty(config, &sink);

        match coordinator.run() {
            Err(RunError::Join(failures)) => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].thread, "monitor");
                assert_eq!(failures[0].reason, "sink rejected event");
            }
            other => panic!("unexpected result {:?}", other.map(|r| r.outcome)),
        }

        let table = coordinator.table().unwrap();
        assert!(table.should_stop());
        assert_eq!(table.flag().transitions(), 1);
        assert!((0..3).all(|id| table.forks().holders(id) == 0));
        assert!(!kinds(&sink.inner.drain()).contains(&EventKind::Died));
    }

    #[test]
    fn test_run_twice_rejected() {
        let config = SimulationConfig::from_millis(2, 800, 10, 10, Some(1)).unwrap();
        let mut coordinator = setup(config, Arc::new(RecordingSink::new()));

        coordinator.run().unwrap();
        assert!(matches!(coordinator.run(), Err(RunError::AlreadyRan)));
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let config = SimulationConfig::from_millis(7, 800, 10, 10, None).unwrap();
        let mut coordinator = setup(config, Arc::new(RecordingSink::new()));

        assert_eq!(
            coordinator.teardown(),
            Some(TeardownReport {
                forks: 7,
                philosophers: 7,
            })
        );
        assert_eq!(coordinator.teardown(), None);
        assert!(coordinator.table().is_none());
        assert!(coordinator.stop_handle().is_none());
        assert!(matches!(coordinator.run(), Err(RunError::TornDown)));
    }

    #[test]
    fn test_join_failure_payloads() {
        let failure = join_failure("monitor", Box::new("boom"));
        assert_eq!(failure.reason, "boom");

        let failure = join_failure("philosopher-1", Box::new(String::from("bad")));
        assert_eq!(failure.thread, "philosopher-1");
        assert_eq!(failure.reason, "bad");

        let failure = join_failure("philosopher-2", Box::new(5u8));
        assert_eq!(failure.reason, "thread panicked");
    }
}
