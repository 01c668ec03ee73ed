//! Bounded reads of source rows
//!
//! Source rows are fetched in windows of a fixed number of slots so a pass
//! never loads an unbounded history and can check its deadline between
//! reads. Long idle stretches are crossed by asking the store for the next
//! active row instead of walking them window by window.

use crate::{parse_row, AggregateResult};
use anyhow::Context;
use solar_core::{Deadline, PowerRecord, Resolution, RowStore, SlotTotals, Timestamp};
use tracing::debug;

/// Window width in slots
pub const DEFAULT_CHUNK_SLOTS: u32 = 2000;

/// Why a scan stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStop {
    /// A window holding at least one active slot was read
    Sufficient,
    /// The newest source row lies in an idle window
    Exhausted,
    /// No non-zero row exists beyond what was read
    NoFurtherData,
    DeadlineReached,
}

#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Parsed rows of one window, ascending by timestamp
    pub rows: Vec<PowerRecord>,
    /// End of that window; every source row before it has been read
    pub covered_until: Timestamp,
    pub stop: ScanStop,
}

#[derive(Debug, Clone, Copy)]
pub struct ChunkedSourceScanner {
    resolution: Resolution,
    chunk_slots: u32,
}

impl ChunkedSourceScanner {
    pub fn new(resolution: Resolution, chunk_slots: u32) -> Self {
        Self {
            resolution,
            chunk_slots: chunk_slots.max(1),
        }
    }

    /// Read windows starting at `slot_start` until one holds a slot worth
    /// storing, the source runs out, or the deadline passes.
    ///
    /// Windows are slot-aligned, so no slot is split between two reads.
    pub async fn scan<S>(
        &self,
        store: &S,
        mut slot_start: Timestamp,
        last_source: Timestamp,
        deadline: &Deadline,
    ) -> AggregateResult<ScanResult>
    where
        S: RowStore + ?Sized,
    {
        let source = self.resolution.source();
        let table = self.resolution.table();

        loop {
            if deadline.expired() {
                debug!("{table}: deadline reached while scanning {source}");
                return Ok(self.stopped(slot_start, ScanStop::DeadlineReached));
            }

            let window_end = self.resolution.advance(slot_start, self.chunk_slots);
            let fetched = store
                .rows_in_range(source, &slot_start, &window_end)
                .await
                .with_context(|| format!("reading {source} from {slot_start}"))?;
            debug!(
                "{table}: found {} rows from {slot_start} to {window_end}",
                fetched.len()
            );

            let window = fetched
                .iter()
                .map(|row| parse_row(source, row))
                .collect::<AggregateResult<Vec<_>>>()?;

            if self.has_active_slot(&window) {
                return Ok(ScanResult {
                    rows: window,
                    covered_until: window_end,
                    stop: ScanStop::Sufficient,
                });
            }

            // An idle window cannot produce a summary row; keeping it would
            // pin the next pass to the same window.
            if window_end > last_source {
                debug!("{table}: reached end of {source}, not enough data to aggregate");
                return Ok(self.stopped(slot_start, ScanStop::Exhausted));
            }

            let after = window.last().map_or(slot_start, |row| row.timestamp);
            let next_active = store
                .first_active_after(source, &after)
                .await
                .with_context(|| format!("searching {source} after {after}"))?;
            match next_active {
                Some(row) => {
                    slot_start = self.resolution.slot_start(parse_row(source, &row)?.timestamp);
                    debug!("{table}: found more data after gap at {slot_start}");
                }
                None => {
                    debug!("{table}: no more data found after {after}");
                    return Ok(self.stopped(slot_start, ScanStop::NoFurtherData));
                }
            }
        }
    }

    /// Whether any slot of a window sums to something worth a row
    fn has_active_slot(&self, window: &[PowerRecord]) -> bool {
        let mut current = None;
        let mut totals = SlotTotals::new();
        for row in window {
            let slot = self.resolution.slot_start(row.timestamp);
            if current != Some(slot) {
                if totals.has_activity() {
                    return true;
                }
                totals = SlotTotals::new();
                current = Some(slot);
            }
            totals.add(row);
        }
        totals.has_activity()
    }

    fn stopped(&self, at: Timestamp, stop: ScanStop) -> ScanResult {
        ScanResult {
            rows: Vec::new(),
            covered_until: at,
            stop,
        }
    }
}
