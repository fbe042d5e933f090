// src/cli.rs
//! Command-line interface
//!
//! ```text
//! philo <number_of_philosophers> <time_to_die> <time_to_eat> <time_to_sleep>
//!       [number_of_times_each_philosopher_must_eat]
//! ```
//!
//! Times are in milliseconds. Every value must be a non-zero positive
//! integer made of digits only.

use crate::utils::config::{EngineSettings, LogFormat, SimulationConfig, MAX_TIME_VALUE};
use crate::utils::errors::{ConfigError, ExitStatus};
use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;

/// Dining philosophers simulation
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "philo", version, about, allow_negative_numbers = true)]
pub struct Cli {
    /// Number of philosophers (and forks) at the table, at most 300
    #[arg(value_parser = parse_positive)]
    pub number_of_philosophers: u64,

    /// Milliseconds a philosopher survives without starting a meal
    #[arg(value_parser = parse_positive)]
    pub time_to_die: u64,

    /// Milliseconds a meal takes
    #[arg(value_parser = parse_positive)]
    pub time_to_eat: u64,

    /// Milliseconds a philosopher sleeps after eating
    #[arg(value_parser = parse_positive)]
    pub time_to_sleep: u64,

    /// Stop once every philosopher has eaten this many times
    #[arg(value_parser = parse_positive)]
    pub number_of_times_each_philosopher_must_eat: Option<u64>,

    /// Engine settings file (TOML, YAML or JSON)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Log format on stderr
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

impl Cli {
    /// Validated simulation parameters
    pub fn simulation_config(&self) -> Result<SimulationConfig, ConfigError> {
        let philosophers = usize::try_from(self.number_of_philosophers).unwrap_or(usize::MAX);

        SimulationConfig::from_millis(
            philosophers,
            self.time_to_die,
            self.time_to_eat,
            self.time_to_sleep,
            self.number_of_times_each_philosopher_must_eat,
        )
    }

    /// Apply command-line overrides on top of loaded settings
    pub fn apply_overrides(&self, settings: &mut EngineSettings) {
        if self.verbose {
            settings.log.level = "debug".to_string();
        }
        if let Some(format) = self.log_format {
            settings.log.format = format;
        }
    }
}

/// Exit status for a command line clap rejected
pub fn exit_status_for(err: &clap::Error) -> ExitStatus {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitStatus::Success,
        ErrorKind::ValueValidation | ErrorKind::InvalidValue => ExitStatus::NotNumeric,
        _ => ExitStatus::ArgumentCount,
    }
}

fn parse_positive(raw: &str) -> Result<u64, String> {
    let not_numeric = || ConfigError::NotNumeric(raw.to_string()).to_string();

    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(not_numeric());
    }

    match raw.parse::<u64>() {
        Ok(value) if value > 0 && value <= MAX_TIME_VALUE => Ok(value),
        _ => Err(not_numeric()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::config::MAX_PHILOSOPHERS;
    use clap::CommandFactory;
    use std::time::Duration;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("philo").chain(args.iter().copied()))
    }

    #[test]
    fn test_command_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_four_arguments() {
        let cli = parse(&["5", "800", "200", "100"]).unwrap();
        let config = cli.simulation_config().unwrap();
        assert_eq!(config.philosophers(), 5);
        assert_eq!(config.time_to_die(), Duration::from_millis(800));
        assert_eq!(config.time_to_eat(), Duration::from_millis(200));
        assert_eq!(config.time_to_sleep(), Duration::from_millis(100));
        assert_eq!(config.required_meals(), None);
    }

    #[test]
    fn test_meal_limit_argument() {
        let cli = parse(&["5", "800", "200", "200", "7"]).unwrap();
        assert_eq!(cli.simulation_config().unwrap().required_meals(), Some(7));
    }

    #[test]
    fn test_wrong_argument_count() {
        let err = parse(&["5", "800"]).unwrap_err();
        assert_eq!(exit_status_for(&err), ExitStatus::ArgumentCount);

        let err = parse(&["5", "800", "200", "200", "7", "9"]).unwrap_err();
        assert_eq!(exit_status_for(&err), ExitStatus::ArgumentCount);
    }

    #[test]
    fn test_non_numeric_arguments() {
        for bad in ["abc", "0", "12ms", "+5", "99999999999999999999"] {
            let err = parse(&["5", bad, "200", "200"]).unwrap_err();
            assert_eq!(exit_status_for(&err), ExitStatus::NotNumeric, "{}", bad);
        }
    }

    #[test]
    fn test_too_many_philosophers() {
        let too_many = (MAX_PHILOSOPHERS + 1).to_string();
        let cli = parse(&[too_many.as_str(), "800", "200", "200"]).unwrap();
        assert!(matches!(
            cli.simulation_config(),
            Err(ConfigError::TooManyPhilosophers { .. })
        ));
    }

    #[test]
    fn test_overrides() {
        let cli = parse(&["--verbose", "--log-format", "json", "2", "800", "200", "200"]).unwrap();
        let mut settings = EngineSettings::default();
        cli.apply_overrides(&mut settings);
        assert_eq!(settings.log.level, "debug");
        assert_eq!(settings.log.format, LogFormat::Json);
    }

    #[test]
    fn test_help_is_success() {
        let err = parse(&["--help"]).unwrap_err();
        assert_eq!(exit_status_for(&err), ExitStatus::Success);
    }
}
