//! Row store seam
//!
//! The aggregation engine only ever talks to storage through [`RowStore`].
//! Range predicates compare the stored ISO-8601 text, so every row of a
//! table is expected to carry the same UTC offset.

use crate::types::{format_timestamp, PowerRecord, StoredRow, Table, Timestamp};
use anyhow::Result;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[async_trait::async_trait]
pub trait RowStore: Send + Sync {
    /// Physically last row (highest id)
    async fn last_row(&self, table: Table) -> Result<Option<StoredRow>>;

    /// Physically first row (lowest id)
    async fn first_row(&self, table: Table) -> Result<Option<StoredRow>>;

    /// Row with the greatest timestamp
    async fn newest_row(&self, table: Table) -> Result<Option<StoredRow>>;

    /// Rows with `start <= timestamp < end`, ascending
    async fn rows_in_range(
        &self,
        table: Table,
        start: &Timestamp,
        end: &Timestamp,
    ) -> Result<Vec<StoredRow>>;

    /// First row strictly after `after` with any non-zero field
    async fn first_active_after(&self, table: Table, after: &Timestamp)
        -> Result<Option<StoredRow>>;

    /// Append all rows in one atomic step, keeping their order as id order
    async fn append_batch(&self, table: Table, rows: &[PowerRecord]) -> Result<()>;
}

/// In-process row store with the same ordering and predicate semantics as
/// the SQLite store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryTables>,
}

#[derive(Debug, Default)]
struct MemoryTables {
    next_id: i64,
    tables: HashMap<Table, Vec<StoredRow>>,
}

impl MemoryTables {
    fn push(&mut self, table: Table, timestamp: String, grid: f64, solar: f64, home: f64) {
        self.next_id += 1;
        let row = StoredRow {
            id: self.next_id,
            grid,
            solar,
            home,
            timestamp,
        };
        self.tables.entry(table).or_default().push(row);
    }

    fn rows(&self, table: Table) -> &[StoredRow] {
        self.tables.get(&table).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row whose timestamp text is stored verbatim
    pub async fn append_raw(&self, table: Table, timestamp: &str, values: [f64; 3]) {
        let [grid, solar, home] = values;
        self.inner
            .write()
            .await
            .push(table, timestamp.to_string(), grid, solar, home);
    }

    /// Snapshot of a table in id order
    pub async fn rows(&self, table: Table) -> Vec<StoredRow> {
        self.inner.read().await.rows(table).to_vec()
    }

    pub async fn count(&self, table: Table) -> usize {
        self.inner.read().await.rows(table).len()
    }

    pub async fn clear(&self, table: Table) {
        self.inner.write().await.tables.remove(&table);
    }
}

fn by_time(a: &&StoredRow, b: &&StoredRow) -> std::cmp::Ordering {
    a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id))
}

fn row_is_active(row: &StoredRow) -> bool {
    row.grid != 0.0 || row.solar != 0.0 || row.home != 0.0
}

#[async_trait::async_trait]
impl RowStore for MemoryStore {
    async fn last_row(&self, table: Table) -> Result<Option<StoredRow>> {
        Ok(self.inner.read().await.rows(table).last().cloned())
    }

    async fn first_row(&self, table: Table) -> Result<Option<StoredRow>> {
        Ok(self.inner.read().await.rows(table).first().cloned())
    }

    async fn newest_row(&self, table: Table) -> Result<Option<StoredRow>> {
        let inner = self.inner.read().await;
        Ok(inner.rows(table).iter().max_by(by_time).cloned())
    }

    async fn rows_in_range(
        &self,
        table: Table,
        start: &Timestamp,
        end: &Timestamp,
    ) -> Result<Vec<StoredRow>> {
        let (start, end) = (format_timestamp(start), format_timestamp(end));
        let inner = self.inner.read().await;
        let mut rows: Vec<&StoredRow> = inner
            .rows(table)
            .iter()
            .filter(|row| row.timestamp >= start && row.timestamp < end)
            .collect();
        rows.sort_by(by_time);
        Ok(rows.into_iter().cloned().collect())
    }

    async fn first_active_after(
        &self,
        table: Table,
        after: &Timestamp,
    ) -> Result<Option<StoredRow>> {
        let after = format_timestamp(after);
        let inner = self.inner.read().await;
        Ok(inner
            .rows(table)
            .iter()
            .filter(|row| row.timestamp > after && row_is_active(row))
            .min_by(by_time)
            .cloned())
    }

    async fn append_batch(&self, table: Table, rows: &[PowerRecord]) -> Result<()> {
        let mut inner = self.inner.write().await;
        for row in rows {
            inner.push(
                table,
                format_timestamp(&row.timestamp),
                row.grid,
                row.solar,
                row.home,
            );
        }
        Ok(())
    }
}
