//! Solar logging daemon
//!
//! Keeps the fiveminute, hourly, weekly and monthly summary tables in step
//! with the raw `samples` and `daily` tables.
//!
//! Modes (first argument):
//! - `run` (default): aggregate on every poll interval until Ctrl+C
//! - `once`: one unbounded catch-up pass, then exit
//! - `purge-fine`: empty the fiveminute and hourly tables so they rebuild

mod config;
mod scheduler;

use anyhow::{bail, Context, Result};
use solar_archive::AggregationRunner;
use solar_config::AppConfig;
use solar_core::{Deadline, Table};
use solar_db::DbClient;
use std::env;
use tracing::{error, info};

use crate::config::DaemonConfig;
use crate::scheduler::Scheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Run,
    Once,
    PurgeFine,
}

impl Mode {
    fn parse(arg: Option<&str>) -> Result<Self> {
        match arg {
            None | Some("run") => Ok(Mode::Run),
            Some("once") => Ok(Mode::Once),
            Some("purge-fine") => Ok(Mode::PurgeFine),
            Some(other) => bail!("Unknown mode '{other}' (expected run, once or purge-fine)"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let app = AppConfig::load().context("Failed to load configuration file")?;
    solar_obs::init("solard", &app.logging);

    let mode = Mode::parse(env::args().nth(1).as_deref())?;
    let config = DaemonConfig::from_sources(&app, |key| env::var(key).ok())?;
    info!("Loaded configuration: {:?}", config);

    if let Some(dir) = config.database_path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
    }

    let db_client = DbClient::open(&config.database_path)
        .await
        .context("Failed to open database")?;
    db_client.ping().await.context("Database ping failed")?;
    db_client
        .init_schema()
        .await
        .context("Failed to initialise schema")?;
    info!("Database ready at {}", config.database_path.display());

    let runner = AggregationRunner::new().with_chunk_slots(config.chunk_slots);

    match mode {
        Mode::PurgeFine => {
            let removed = db_client
                .clear_tables(&[Table::FiveMinute, Table::Hourly])
                .await
                .context("Failed to purge fine summaries")?;
            info!("Purged {} rows from fiveminute and hourly", removed);
        }
        Mode::Once => {
            let scheduler = Scheduler::new(
                db_client.clone(),
                runner,
                config.poll_interval,
                config.grace,
            );
            let summary = scheduler.run_pass(&Deadline::unbounded()).await;
            info!("Catch-up pass finished: {:?}", summary);
            if summary.failures > 0 {
                bail!("{} resolution(s) failed", summary.failures);
            }
        }
        Mode::Run => {
            let mut scheduler = Scheduler::new(
                db_client.clone(),
                runner,
                config.poll_interval,
                config.grace,
            );

            info!("Daemon running - press Ctrl+C to stop");

            tokio::select! {
                result = scheduler.run() => {
                    if let Err(e) = result {
                        error!("Scheduler error: {}", e);
                        return Err(e);
                    }
                }
                signal = tokio::signal::ctrl_c() => {
                    signal.context("Failed to listen for shutdown signal")?;
                    info!("Shutdown signal received");
                    scheduler.stop();
                }
            }
        }
    }

    db_client.close().await;
    info!("Solar daemon stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!(Mode::parse(None).unwrap(), Mode::Run);
        assert_eq!(Mode::parse(Some("run")).unwrap(), Mode::Run);
        assert_eq!(Mode::parse(Some("once")).unwrap(), Mode::Once);
        assert_eq!(Mode::parse(Some("purge-fine")).unwrap(), Mode::PurgeFine);
        assert!(Mode::parse(Some("rebuild")).is_err());
    }
}
