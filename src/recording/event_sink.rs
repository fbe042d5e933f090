// src/recording/event_sink.rs
//! Lifecycle events and the sinks that receive them
//!
//! The engine never prints directly. Every reportable moment of a
//! philosopher's life is turned into a [`LifecycleEvent`] and handed to an
//! [`EventSink`] while the termination flag is held, so a sink never sees an
//! event produced after the simulation was flagged as over.

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::fmt;
use std::io::Write;
use tracing::warn;

/// What happened to a philosopher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    TookFork,
    Eating,
    Sleeping,
    Thinking,
    Died,
}

impl EventKind {
    /// Human-readable label printed by the console sink
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::TookFork => "has taken a fork",
            EventKind::Eating => "is eating",
            EventKind::Sleeping => "is sleeping",
            EventKind::Thinking => "is thinking",
            EventKind::Died => "died",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A timestamped lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleEvent {
    /// Microseconds since the simulation epoch
    pub elapsed_us: u64,

    /// Zero-based philosopher index
    pub philosopher: usize,

    pub kind: EventKind,
}

impl LifecycleEvent {
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_us / 1_000
    }
}

impl fmt::Display for LifecycleEvent {
    /// `<ms since start>\t<1-based id>\t<label>`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}",
            self.elapsed_ms(),
            self.philosopher + 1,
            self.kind
        )
    }
}

/// Receiver of lifecycle events
///
/// `emit` is called with the termination flag locked. Implementations must
/// not block for long and must not call back into the engine.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &LifecycleEvent);
}

/// Prints events to stdout, one line each
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for ConsoleSink {
    fn emit(&self, event: &LifecycleEvent) {
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", event) {
            warn!("Failed to write event to stdout: {}", e);
        }
    }
}

/// Collects events in memory through an unbounded channel
pub struct RecordingSink {
    tx: Sender<LifecycleEvent>,
    rx: Receiver<LifecycleEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Take every event recorded since the last drain, in emission order
    pub fn drain(&self) -> Vec<LifecycleEvent> {
        self.rx.try_iter().collect()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &LifecycleEvent) {
        // Both ends live in `self`, so the channel cannot be disconnected.
        let _ = self.tx.send(*event);
    }
}
