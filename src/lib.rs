// src/lib.rs
//! Philo Engine Library
//!
//! A dining philosophers simulation: N philosophers share N forks around a
//! ring, each on its own thread, while a monitor thread watches for
//! starvation or for everyone having eaten enough.
//!
//! # Architecture
//!
//! The engine is structured into several key modules:
//!
//! - **runtime**: forks, philosopher lifecycle, monitor, coordinator
//! - **recording**: lifecycle events and the sinks that receive them
//! - **observability**: tracing subscriber and metric descriptions
//! - **cli**: command-line parsing for the `philo` binary
//! - **utils**: clock, configuration and error types
//!
//! # Example
//!
//! ```no_run
//! use philo_engine::{Coordinator, RecordingSink, SimulationConfig};
//! use philo_engine::utils::config::TimingSettings;
//! use std::sync::Arc;
//!
//! let config = SimulationConfig::from_millis(5, 800, 200, 200, Some(3)).unwrap();
//! let sink = Arc::new(RecordingSink::new());
//! let mut coordinator = Coordinator::setup(config, TimingSettings::default(), sink.clone()).unwrap();
//! let report = coordinator.run().unwrap();
//! coordinator.teardown();
//! println!("{:?}: {} events", report.outcome, sink.drain().len());
//! ```

// Public module exports
pub mod cli;
pub mod observability;
pub mod recording;
pub mod runtime;
pub mod utils;

// Re-export commonly used types
pub use recording::{ConsoleSink, EventKind, EventSink, LifecycleEvent, RecordingSink};
pub use runtime::{Coordinator, MonitorOutcome, RunReport, StopHandle};
pub use utils::config::{EngineSettings, SimulationConfig};
pub use utils::errors::{EngineError, ExitStatus, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
