//! Runs every resolution in order under one deadline

use crate::{AggregateResult, AggregationOutcome, Aggregator, DEFAULT_CHUNK_SLOTS};
use solar_core::{Deadline, Resolution, RowStore};

/// Result of one resolution's pass
#[derive(Debug)]
pub struct ResolutionReport {
    pub resolution: Resolution,
    pub result: AggregateResult<AggregationOutcome>,
}

/// Drives five-minute, hourly, weekly and monthly aggregation in sequence.
///
/// Each resolution is bounded by the same deadline and fails on its own:
/// a bad row in `daily` does not hold back the five-minute table.
#[derive(Debug, Clone, Copy)]
pub struct AggregationRunner {
    chunk_slots: u32,
}

impl AggregationRunner {
    pub fn new() -> Self {
        Self {
            chunk_slots: DEFAULT_CHUNK_SLOTS,
        }
    }

    pub fn with_chunk_slots(mut self, chunk_slots: u32) -> Self {
        self.chunk_slots = chunk_slots;
        self
    }

    pub async fn run_all<S>(&self, store: &S, deadline: &Deadline) -> Vec<ResolutionReport>
    where
        S: RowStore + ?Sized,
    {
        let mut reports = Vec::with_capacity(Resolution::ALL.len());
        for resolution in Resolution::ALL {
            let result = Aggregator::new(store, resolution)
                .with_chunk_slots(self.chunk_slots)
                .process_aggregation(deadline)
                .await;
            reports.push(ResolutionReport { resolution, result });
        }
        reports
    }
}

impl Default for AggregationRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AggregateError, Progress};
    use solar_core::{MemoryStore, Table};

    #[tokio::test]
    async fn test_runs_all_resolutions_in_order() {
        let store = MemoryStore::new();
        for minute in [0, 1, 5, 61] {
            let stamp = format!("2024-03-01T{:02}:{:02}:00+00:00", 10 + minute / 60, minute % 60);
            store
                .append_raw(Table::Samples, &stamp, [100.0, 0.0, 100.0])
                .await;
        }

        let reports = AggregationRunner::new()
            .run_all(&store, &Deadline::unbounded())
            .await;
        let order: Vec<Resolution> = reports.iter().map(|r| r.resolution).collect();
        assert_eq!(order, Resolution::ALL);

        let written: Vec<usize> = reports
            .iter()
            .map(|r| r.result.as_ref().unwrap().rows_written)
            .collect();
        assert_eq!(written, [2, 1, 0, 0]);

        let weekly = reports[2].result.as_ref().unwrap();
        assert_eq!(weekly.progress, Progress::NoSourceData);
    }

    #[tokio::test]
    async fn test_failure_is_isolated_to_one_resolution() {
        let store = MemoryStore::new();
        store
            .append_raw(Table::Samples, "2024-03-01T10:00:00+00:00", [1.0, 1.0, 1.0])
            .await;
        store
            .append_raw(Table::Samples, "2024-03-01T11:00:00+00:00", [1.0, 1.0, 1.0])
            .await;
        store
            .append_raw(Table::Daily, "01/03/2024", [1.0, 1.0, 1.0])
            .await;

        let reports = AggregationRunner::new()
            .with_chunk_slots(50)
            .run_all(&store, &Deadline::unbounded())
            .await;

        assert_eq!(reports[0].result.as_ref().unwrap().rows_written, 1);
        assert_eq!(reports[1].result.as_ref().unwrap().rows_written, 1);
        assert!(matches!(
            reports[2].result,
            Err(AggregateError::DataIntegrity {
                table: Table::Daily,
                ..
            })
        ));
        assert!(reports[3].result.is_err());
    }
}
