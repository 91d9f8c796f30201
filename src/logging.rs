use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, DEFAULT_LOG_FILTER};

/// Install the global subscriber. Events go to the log file in the data
/// directory; stdout and stderr belong to the CLI output and the TUI.
pub(crate) fn init(config: &Config) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
        .with_context(|| format!("Failed to open log file: {}", config.log_path.display()))?;

    let filter = EnvFilter::try_new(&config.log_filter)
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .context("Invalid log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "fintrack starting");
    Ok(())
}
