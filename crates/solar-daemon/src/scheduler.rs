//! Periodic aggregation scheduler

use anyhow::Result;
use chrono::Utc;
use solar_archive::{AggregationRunner, Progress};
use solar_core::{Deadline, RowStore};
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Totals for one pass over every resolution
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    pub rows_written: usize,
    pub failures: usize,
    pub unfinished: usize,
}

/// Scheduler runs an aggregation pass on every tick, bounded by the next one
pub struct Scheduler<S> {
    store: S,
    runner: AggregationRunner,
    poll_interval: Duration,
    grace: chrono::Duration,
    running: bool,
}

impl<S: RowStore> Scheduler<S> {
    pub fn new(
        store: S,
        runner: AggregationRunner,
        poll_interval: Duration,
        grace: chrono::Duration,
    ) -> Self {
        Self {
            store,
            runner,
            poll_interval,
            grace,
            running: false,
        }
    }

    /// Tick until stopped. Pass errors are logged and the loop keeps going.
    pub async fn run(&mut self) -> Result<()> {
        self.running = true;
        info!("Scheduler started, poll interval {:?}", self.poll_interval);

        let mut ticker = time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while self.running {
            ticker.tick().await;
            let next_tick = chrono::Duration::from_std(self.poll_interval)
                .ok()
                .and_then(|d| Utc::now().checked_add_signed(d));
            let deadline = match next_tick {
                Some(at) => Deadline::with_grace(at, self.grace),
                None => Deadline::unbounded(),
            };
            self.run_pass(&deadline).await;
        }

        info!("Scheduler stopped");
        Ok(())
    }

    /// One pass over every resolution
    pub async fn run_pass(&self, deadline: &Deadline) -> PassSummary {
        let mut summary = PassSummary::default();
        for report in self.runner.run_all(&self.store, deadline).await {
            match report.result {
                Ok(outcome) => {
                    summary.rows_written += outcome.rows_written;
                    match outcome.progress {
                        Progress::DeadlineReached => {
                            summary.unfinished += 1;
                            warn!("{}: deadline reached, resuming next pass", report.resolution);
                        }
                        Progress::NoSourceData => {
                            debug!("{}: no source data yet", report.resolution);
                        }
                        Progress::CaughtUp => {}
                    }
                }
                Err(e) => {
                    summary.failures += 1;
                    error!("{}: aggregation failed: {}", report.resolution, e);
                }
            }
        }
        summary
    }

    pub fn stop(&mut self) {
        info!("Stopping scheduler...");
        self.running = false;
    }

    #[allow(dead_code)]
    pub fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solar_core::{MemoryStore, Table};

    fn scheduler(store: MemoryStore) -> Scheduler<MemoryStore> {
        Scheduler::new(
            store,
            AggregationRunner::new(),
            Duration::from_secs(30),
            chrono::Duration::seconds(5),
        )
    }

    #[tokio::test]
    async fn test_pass_summary() {
        let store = MemoryStore::new();
        for stamp in ["2024-03-01T10:00:00+00:00", "2024-03-01T11:00:00+00:00"] {
            store.append_raw(Table::Samples, stamp, [5.0, 5.0, 5.0]).await;
        }
        store
            .append_raw(Table::Daily, "yesterday", [1.0, 1.0, 1.0])
            .await;

        let scheduler = scheduler(store);
        let summary = scheduler.run_pass(&Deadline::unbounded()).await;
        assert_eq!(
            summary,
            PassSummary {
                rows_written: 2,
                failures: 2,
                unfinished: 0,
            }
        );
        assert_eq!(scheduler.store.count(Table::FiveMinute).await, 1);
        assert_eq!(scheduler.store.count(Table::Hourly).await, 1);
    }

    #[tokio::test]
    async fn test_expired_pass_is_unfinished() {
        let store = MemoryStore::new();
        store
            .append_raw(Table::Samples, "2024-03-01T10:00:00+00:00", [5.0, 5.0, 5.0])
            .await;

        let scheduler = scheduler(store);
        let expired = Deadline::with_grace(Utc::now(), chrono::Duration::seconds(60));
        let summary = scheduler.run_pass(&expired).await;
        assert_eq!(summary.rows_written, 0);
        assert_eq!(summary.unfinished, 2);
    }

    #[tokio::test]
    async fn test_stop_clears_running() {
        let mut scheduler = scheduler(MemoryStore::new());
        assert!(!scheduler.is_running());
        scheduler.running = true;
        scheduler.stop();
        assert!(!scheduler.is_running());
    }
}
