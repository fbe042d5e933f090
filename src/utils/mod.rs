// src/utils/mod.rs
//! Common utilities: clock, configuration and error types

pub mod clock;
pub mod config;
pub mod errors;

pub use self::config::{EngineSettings, SimulationConfig};
pub use errors::{EngineError, ExitStatus, Result};
