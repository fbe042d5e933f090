// src/runtime/mod.rs
//! Simulation runtime
//!
//! This module provides the concurrency engine, including:
//!
//! - **Coordinator**: setup, thread orchestration, joined shutdown
//! - **Table**: state shared by every thread of a run
//! - **Philosopher**: the per-thread eat → sleep → think lifecycle
//! - **Monitor**: starvation and satisfaction detection
//! - **Forks**: the ring of exclusive forks
//! - **Start Gate** / **Termination Flag**: start and stop signalling
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      Coordinator                         │
//! │                                                          │
//! │   philosopher-1   philosopher-2   ...   philosopher-N    │
//! │        │  ▲            │  ▲                  │  ▲        │
//! │        ▼  │            ▼  │                  ▼  │        │
//! │   ┌────────────────── Table ──────────────────────┐      │
//! │   │ forks[N]  meal records[N]  gate  flag  sink   │      │
//! │   └───────────────────────────────────────────────┘      │
//! │                         ▲                                │
//! │                         │ reads records, sets flag       │
//! │                      monitor                             │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! One OS thread per philosopher plus one monitor thread, all scoped to
//! [`Coordinator::run`].

pub mod agent_state;
pub mod coordinator;
pub mod forks;
pub mod monitor;
pub mod philosopher;
pub mod start_gate;
pub mod table;
pub mod termination;

// Re-export commonly used types
pub use agent_state::AgentState;
pub use coordinator::{Coordinator, RunReport, StopHandle, TeardownReport};
pub use forks::{ForkGuard, ForkSet};
pub use monitor::{Monitor, MonitorOutcome};
pub use philosopher::{Departure, LifecycleState, Philosopher, PhilosopherSummary};
pub use start_gate::{GateOutcome, StartGate};
pub use table::Table;
pub use termination::TerminationFlag;
