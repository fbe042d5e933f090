// src/observability/mod.rs
//! Logging and metrics setup
//!
//! Logs go to stderr so stdout carries nothing but simulation events.
//! Metrics are recorded through the `metrics` facade; no exporter is
//! installed, so they cost nothing unless an embedding application installs
//! a recorder.

use crate::utils::config::{LogFormat, LogSettings};
use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(settings: &LogSettings) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.level)?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_thread_names(true);

    match settings.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    }
    .map_err(|e| anyhow::anyhow!(e))?;

    Ok(())
}

/// Register descriptions for the engine's metrics
pub fn describe_metrics() {
    metrics::describe_counter!("philo_meals_total", "Meals completed by all philosophers");
    metrics::describe_counter!("philo_forks_acquired_total", "Fork acquisitions");
    metrics::describe_counter!("philo_deaths_total", "Philosophers that starved");
    metrics::describe_counter!("philo_runs_total", "Finished runs, labelled by outcome");
}
