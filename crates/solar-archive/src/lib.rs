//! Incremental summary aggregation
//!
//! Folds raw samples and daily totals into the five-minute, hourly, weekly
//! and monthly summary tables. Progress lives entirely in the summary
//! tables themselves: each pass resumes after the last stored slot, so an
//! interrupted or deadline-bounded pass is always safe to repeat.

pub mod aggregator;
pub mod cursor;
pub mod runner;
pub mod scanner;

pub use aggregator::*;
pub use cursor::*;
pub use runner::*;
pub use scanner::*;

use solar_core::{PowerRecord, StoredRow, Table};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error(transparent)]
    Storage(#[from] anyhow::Error),

    #[error("Unparseable timestamp {value:?} in {table} row {id}: {source}")]
    DataIntegrity {
        table: Table,
        id: i64,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

pub type AggregateResult<T> = Result<T, AggregateError>;

/// Parse a stored row, turning a bad timestamp into a data-integrity error
pub(crate) fn parse_row(table: Table, row: &StoredRow) -> AggregateResult<PowerRecord> {
    row.parse().map_err(|source| AggregateError::DataIntegrity {
        table,
        id: row.id,
        value: row.timestamp.clone(),
        source,
    })
}
