//! Where the next pass starts

use crate::{parse_row, AggregateResult};
use anyhow::Context;
use solar_core::{Resolution, RowStore, Timestamp};
use tracing::debug;

/// Derives the next unprocessed slot from persisted state only
#[derive(Debug, Clone, Copy)]
pub struct AggregationCursor {
    resolution: Resolution,
}

impl AggregationCursor {
    pub fn new(resolution: Resolution) -> Self {
        Self { resolution }
    }

    /// Start of the first slot not yet stored, or `None` when neither the
    /// summary nor its source table has any rows.
    pub async fn resolve_start<S>(&self, store: &S) -> AggregateResult<Option<Timestamp>>
    where
        S: RowStore + ?Sized,
    {
        let table = self.resolution.table();
        let last = store
            .last_row(table)
            .await
            .with_context(|| format!("reading last {table} row"))?;
        if let Some(row) = last {
            let committed = self.resolution.slot_start(parse_row(table, &row)?.timestamp);
            return Ok(Some(self.resolution.next_slot(committed)));
        }

        let source = self.resolution.source();
        let first = store
            .first_row(source)
            .await
            .with_context(|| format!("reading first {source} row"))?;
        match first {
            Some(row) => {
                let start = self.resolution.slot_start(parse_row(source, &row)?.timestamp);
                debug!("{table}: empty, bootstrapping from {source} at {start}");
                Ok(Some(start))
            }
            None => Ok(None),
        }
    }
}
