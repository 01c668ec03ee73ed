//! Daemon configuration: TOML file first, environment overrides on top

use anyhow::{Context, Result};
use solar_config::AppConfig;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Time between aggregation passes (default: 30s)
    pub poll_interval: Duration,

    /// Slack kept before the next tick
    pub grace: chrono::Duration,

    /// Source window width, in target slots
    pub chunk_slots: u32,
}

impl DaemonConfig {
    /// Load from `SOLARLOG_CONFIG` and the process environment
    pub fn from_env() -> Result<Self> {
        let app = AppConfig::load().context("Failed to load configuration file")?;
        Self::from_sources(&app, |key| env::var(key).ok())
    }

    /// `DATABASE_PATH` and `POLL_INTERVAL` win over the file values
    pub fn from_sources<F>(app: &AppConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = lookup("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| app.database_path());

        let poll_secs = match lookup("POLL_INTERVAL") {
            Some(raw) => raw.parse().context("Invalid POLL_INTERVAL")?,
            None => app.aggregation.poll_interval_secs,
        };
        anyhow::ensure!(poll_secs > 0, "POLL_INTERVAL must be positive");

        let grace_secs = i64::try_from(app.aggregation.grace_secs)
            .context("Invalid aggregation.grace_secs")?;

        Ok(Self {
            database_path,
            poll_interval: Duration::from_secs(poll_secs),
            grace: chrono::Duration::seconds(grace_secs),
            chunk_slots: app.aggregation.chunk_slots,
        })
    }
}
