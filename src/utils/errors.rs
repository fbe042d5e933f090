// src/utils/errors.rs
//! Error types for the simulation engine
//!
//! Errors are grouped by the phase that produces them:
//!
//! - **ConfigError**: invalid simulation parameters, raised before anything
//!   is allocated
//! - **SettingsError**: the engine settings file or environment could not be
//!   loaded
//! - **SetupError**: forks or philosopher records could not be allocated
//! - **RunError**: threads could not be spawned or joined
//!
//! Every error maps onto a process [`ExitStatus`].

use std::fmt;
use thiserror::Error;

/// Result type used throughout the engine
pub type Result<T> = std::result::Result<T, EngineError>;

/// Invalid simulation parameters
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Improper amount of arguments: expected 4 or 5, got {0}")]
    ArgumentCount(usize),

    #[error("Arguments must be only non zero positive numbers (got '{0}')")]
    NotNumeric(String),

    #[error("Too many philosophers: {requested} (maximum is {max})")]
    TooManyPhilosophers { requested: usize, max: usize },

    #[error("At least one philosopher is required")]
    NoPhilosophers,
}

/// Engine settings could not be loaded
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid setting '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Resource allocation failed during setup
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Failed to allocate {what} for {count} philosophers")]
    Allocation { what: &'static str, count: usize },
}

/// A thread that could not be joined, and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinFailure {
    /// Thread name (`monitor` or `philosopher-<n>`)
    pub thread: String,

    /// Panic payload, if it was a string
    pub reason: String,
}

impl fmt::Display for JoinFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.thread, self.reason)
    }
}

/// Thread lifecycle failures during a run
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Failed to create {thread} thread: {source}")]
    ThreadSpawn {
        thread: String,
        #[source]
        source: std::io::Error,
        /// Join failures hit while cleaning up after the spawn failure
        join_failures: Vec<JoinFailure>,
    },

    #[error("Failed to join {} thread(s): {}", .0.len(), join_list(.0))]
    Join(Vec<JoinFailure>),

    #[error("Simulation resources were already torn down")]
    TornDown,

    #[error("Simulation has already run")]
    AlreadyRan,
}

fn join_list(failures: &[JoinFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Umbrella error for callers that drive the whole engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error(transparent)]
    Run(#[from] RunError),
}

/// Process exit status for each outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitStatus {
    Success = 0,
    Failure = 1,
    ArgumentCount = 2,
    NotNumeric = 3,
    TooManyPhilosophers = 4,
    Allocation = 5,
    ThreadSpawn = 7,
    ThreadJoin = 8,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        std::process::ExitCode::from(status.code())
    }
}

impl EngineError {
    /// Exit status the binary reports for this error
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            EngineError::Config(ConfigError::ArgumentCount(_)) => ExitStatus::ArgumentCount,
            EngineError::Config(ConfigError::NotNumeric(_))
            | EngineError::Config(ConfigError::NoPhilosophers) => ExitStatus::NotNumeric,
            EngineError::Config(ConfigError::TooManyPhilosophers { .. }) => {
                ExitStatus::TooManyPhilosophers
            }
            EngineError::Settings(_) => ExitStatus::Failure,
            EngineError::Setup(SetupError::Allocation { .. }) => ExitStatus::Allocation,
            EngineError::Run(RunError::ThreadSpawn { .. }) => ExitStatus::ThreadSpawn,
            EngineError::Run(RunError::Join(_)) => ExitStatus::ThreadJoin,
            EngineError::Run(RunError::TornDown) | EngineError::Run(RunError::AlreadyRan) => {
                ExitStatus::Failure
            }
        }
    }
}
