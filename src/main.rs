// src/main.rs
//! Philo
//!
//! Runs one dining philosophers simulation and prints its events to stdout:
//!
//! ```text
//! <ms since start>\t<philosopher>\t<event>
//! ```

use clap::Parser;
use philo_engine::cli::{self, Cli};
use philo_engine::observability::{describe_metrics, init_tracing};
use philo_engine::{ConsoleSink, Coordinator, EngineError, EngineSettings, ExitStatus, RunReport};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let status = cli::exit_status_for(&err);
            // Nothing useful can be done if stdout/stderr are gone.
            let _ = err.print();
            return status.into();
        }
    };

    let mut settings = match EngineSettings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("{}", err);
            return EngineError::from(err).exit_status().into();
        }
    };
    cli.apply_overrides(&mut settings);

    if let Err(err) = init_tracing(&settings.log) {
        eprintln!("Failed to initialize logging: {:#}", err);
        return ExitStatus::Failure.into();
    }
    describe_metrics();

    info!("Starting philo v{}", philo_engine::VERSION);

    match simulate(&cli, &settings) {
        Ok(report) => {
            info!("Outcome: {:?}", report.outcome);
            ExitStatus::Success.into()
        }
        Err(err) => {
            error!("{}", err);
            eprintln!("{}", err);
            err.exit_status().into()
        }
    }
}

fn simulate(cli: &Cli, settings: &EngineSettings) -> philo_engine::Result<RunReport> {
    let config = cli.simulation_config()?;

    let mut coordinator =
        Coordinator::setup(config, settings.timing.clone(), Arc::new(ConsoleSink::new()))?;
    let report = coordinator.run();
    coordinator.teardown();

    Ok(report?)
}
