// src/recording/mod.rs
//! Event reporting
//!
//! Philosopher threads and the monitor report what happens at the table
//! through an [`EventSink`]:
//!
//! - **ConsoleSink**: one tab-separated line per event on stdout
//! - **RecordingSink**: in-memory channel, for tests and embedding callers
//!
//! # Architecture
//!
//! ```text
//! Philosopher / Monitor → Table::report() → [termination flag locked]
//!                                                   ↓
//!                                        flag still false? → EventSink::emit()
//! ```

pub mod event_sink;

// Re-export commonly used types
pub use event_sink::{ConsoleSink, EventKind, EventSink, LifecycleEvent, RecordingSink};
