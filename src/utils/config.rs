// src/utils/config.rs
//! Simulation parameters and engine settings
//!
//! Two kinds of configuration exist:
//!
//! - [`SimulationConfig`]: the table itself (how many philosophers, how long
//!   they take to starve, eat and sleep). Comes from the command line and is
//!   immutable once validated.
//! - [`EngineSettings`]: how the engine runs (logging, poll and nap
//!   granularity). Layered with the `config` crate: defaults, then an
//!   optional settings file, then `PHILO_*` environment variables.

use crate::utils::errors::{ConfigError, SettingsError};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Maximum number of philosophers a table can seat
pub const MAX_PHILOSOPHERS: usize = 300;

/// Largest accepted millisecond value on the command line
pub const MAX_TIME_VALUE: u64 = 9_223_372_036_854_775;

/// Validated simulation parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    philosophers: usize,
    time_to_die: Duration,
    time_to_eat: Duration,
    time_to_sleep: Duration,
    required_meals: Option<u64>,
}

impl SimulationConfig {
    /// Validate and build a configuration
    pub fn new(
        philosophers: usize,
        time_to_die: Duration,
        time_to_eat: Duration,
        time_to_sleep: Duration,
        required_meals: Option<u64>,
    ) -> Result<Self, ConfigError> {
        if philosophers == 0 {
            return Err(ConfigError::NoPhilosophers);
        }
        if philosophers > MAX_PHILOSOPHERS {
            return Err(ConfigError::TooManyPhilosophers {
                requested: philosophers,
                max: MAX_PHILOSOPHERS,
            });
        }

        Ok(Self {
            philosophers,
            time_to_die,
            time_to_eat,
            time_to_sleep,
            required_meals,
        })
    }

    /// Shorthand with all times in milliseconds
    pub fn from_millis(
        philosophers: usize,
        die_ms: u64,
        eat_ms: u64,
        sleep_ms: u64,
        required_meals: Option<u64>,
    ) -> Result<Self, ConfigError> {
        Self::new(
            philosophers,
            Duration::from_millis(die_ms),
            Duration::from_millis(eat_ms),
            Duration::from_millis(sleep_ms),
            required_meals,
        )
    }

    pub fn philosophers(&self) -> usize {
        self.philosophers
    }

    pub fn time_to_die(&self) -> Duration {
        self.time_to_die
    }

    pub fn time_to_eat(&self) -> Duration {
        self.time_to_eat
    }

    pub fn time_to_sleep(&self) -> Duration {
        self.time_to_sleep
    }

    /// `None` means philosophers eat until someone starves
    pub fn required_meals(&self) -> Option<u64> {
        self.required_meals
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,

    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Engine timing knobs
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    /// Monitor poll interval in microseconds (default: 500)
    pub monitor_poll_us: u64,

    /// Slice width of interruptible naps in microseconds (default: 500)
    pub nap_slice_us: u64,

    /// Even philosophers delay their first cycle by `time_to_eat / stagger_divisor`
    pub stagger_divisor: u32,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            monitor_poll_us: 500,
            nap_slice_us: 500,
            stagger_divisor: 10,
        }
    }
}

impl TimingSettings {
    pub fn monitor_poll(&self) -> Duration {
        Duration::from_micros(self.monitor_poll_us)
    }

    pub fn nap_slice(&self) -> Duration {
        Duration::from_micros(self.nap_slice_us)
    }
}

/// Engine-wide settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub log: LogSettings,
    pub timing: TimingSettings,
}

impl EngineSettings {
    /// Load settings: defaults, then `path` if given, then `PHILO_*` env vars
    ///
    /// Nested keys use `__` in environment variables, e.g.
    /// `PHILO_TIMING__MONITOR_POLL_US=250`.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings: EngineSettings = builder
            .add_source(
                Environment::with_prefix("PHILO")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.timing.monitor_poll_us == 0 {
            return Err(SettingsError::Invalid {
                key: "timing.monitor_poll_us",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.timing.nap_slice_us == 0 {
            return Err(SettingsError::Invalid {
                key: "timing.nap_slice_us",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.timing.stagger_divisor == 0 {
            return Err(SettingsError::Invalid {
                key: "timing.stagger_divisor",
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}
