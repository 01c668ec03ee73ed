//! Slot aggregation for one resolution

use crate::{
    parse_row, AggregateResult, AggregationCursor, ChunkedSourceScanner, ScanStop,
    DEFAULT_CHUNK_SLOTS,
};
use anyhow::Context;
use solar_core::{format_timestamp, Deadline, Resolution, RowStore, SlotTotals};
use tracing::{debug, info, instrument};

/// How far a pass got
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// The source table is empty
    NoSourceData,
    /// Every slot that can be closed is stored
    CaughtUp,
    /// Stopped early; the next call continues where this one ended
    DeadlineReached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationOutcome {
    pub resolution: Resolution,
    pub rows_written: usize,
    pub progress: Progress,
}

/// Aggregation engine for one resolution
pub struct Aggregator<'a, S: ?Sized> {
    store: &'a S,
    resolution: Resolution,
    cursor: AggregationCursor,
    scanner: ChunkedSourceScanner,
}

impl<'a, S> Aggregator<'a, S>
where
    S: RowStore + ?Sized,
{
    pub fn new(store: &'a S, resolution: Resolution) -> Self {
        Self {
            store,
            resolution,
            cursor: AggregationCursor::new(resolution),
            scanner: ChunkedSourceScanner::new(resolution, DEFAULT_CHUNK_SLOTS),
        }
    }

    /// Override the scan window width (slots per read)
    pub fn with_chunk_slots(mut self, chunk_slots: u32) -> Self {
        self.scanner = ChunkedSourceScanner::new(self.resolution, chunk_slots);
        self
    }

    /// Summarise every closed slot after the last stored one, stopping
    /// early if `deadline` passes. All rows produced by one call are
    /// appended in a single batch.
    ///
    /// The slot holding the newest source row is never stored: more
    /// samples may still arrive for it.
    #[instrument(skip(self, deadline), fields(table = %self.resolution))]
    pub async fn process_aggregation(
        &self,
        deadline: &Deadline,
    ) -> AggregateResult<AggregationOutcome> {
        let table = self.resolution.table();
        let source = self.resolution.source();

        let Some(mut slot_start) = self.cursor.resolve_start(self.store).await? else {
            debug!("{table}: no source data found");
            return Ok(self.outcome(0, Progress::NoSourceData));
        };

        let newest = self
            .store
            .newest_row(source)
            .await
            .with_context(|| format!("reading newest {source} row"))?;
        let Some(newest) = newest else {
            debug!("{table}: no source data found");
            return Ok(self.outcome(0, Progress::NoSourceData));
        };
        let last_source = parse_row(source, &newest)?.timestamp;

        let scan = self
            .scanner
            .scan(self.store, slot_start, last_source, deadline)
            .await?;
        let mut deadline_hit = scan.stop == ScanStop::DeadlineReached;
        let rows = scan.rows;

        let mut batch = Vec::new();
        if !rows.is_empty() {
            // Slots before the window end are complete, except the one that
            // may still receive samples.
            let limit = scan
                .covered_until
                .min(self.resolution.slot_start(last_source));
            let mut idx = 0;

            while slot_start < limit {
                if deadline.expired() {
                    deadline_hit = true;
                    break;
                }

                let mut slot_end = self.resolution.next_slot(slot_start);

                while rows.get(idx).is_some_and(|row| row.timestamp < slot_start) {
                    idx += 1;
                }
                let mut totals = SlotTotals::new();
                while let Some(row) = rows.get(idx).filter(|row| row.timestamp < slot_end) {
                    totals.add(row);
                    idx += 1;
                }

                if totals.has_activity() {
                    let record = totals.finish(slot_start, self.resolution.conversion());
                    debug!(
                        "{table}: ({}, {:.2}, {:.2}, {:.2})",
                        format_timestamp(&record.timestamp),
                        record.grid,
                        record.solar,
                        record.home
                    );
                    batch.push(record);
                } else {
                    // rows[idx..] all start at or after slot_end
                    slot_end = match rows[idx..].iter().find(|row| row.contributes()) {
                        Some(next) => self.resolution.slot_start(next.timestamp),
                        None => limit,
                    };
                    debug!("{table}: skip to slot {slot_end}");
                }

                slot_start = slot_end;
            }
        }

        if !batch.is_empty() {
            self.store
                .append_batch(table, &batch)
                .await
                .with_context(|| format!("appending {} rows to {table}", batch.len()))?;
            info!("Inserted {} rows into {}", batch.len(), table);
        }

        let progress = if deadline_hit {
            Progress::DeadlineReached
        } else {
            Progress::CaughtUp
        };
        Ok(self.outcome(batch.len(), progress))
    }

    fn outcome(&self, rows_written: usize, progress: Progress) -> AggregationOutcome {
        AggregationOutcome {
            resolution: self.resolution,
            rows_written,
            progress,
        }
    }
}
