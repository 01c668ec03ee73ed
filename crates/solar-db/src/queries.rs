//! Database query operations for the power tables

use crate::schema::{create_statements, PowerRow, COLUMNS};
use crate::{DbClient, DbResult};
use anyhow::Result;
use solar_core::{format_timestamp, PowerRecord, RowStore, StoredRow, Table, Timestamp};
use sqlx::Row;
use tracing::{debug, instrument};

impl DbClient {
    /// Create any missing tables and indexes
    #[instrument(skip(self))]
    pub async fn init_schema(&self) -> DbResult<()> {
        for table in Table::ALL {
            for statement in create_statements(table) {
                sqlx::query(&statement).execute(self.pool()).await?;
            }
        }
        debug!("Schema initialised");
        Ok(())
    }

    async fn fetch_one_ordered(&self, table: Table, order: &str) -> DbResult<Option<PowerRow>> {
        let sql = format!("SELECT {COLUMNS} FROM {table} ORDER BY {order} LIMIT 1");
        let row = sqlx::query_as::<_, PowerRow>(&sql)
            .fetch_optional(self.pool())
            .await?;
        Ok(row)
    }

    /// Get the physically last row of a table
    #[instrument(skip(self))]
    pub async fn latest_by_id(&self, table: Table) -> DbResult<Option<PowerRow>> {
        self.fetch_one_ordered(table, "id DESC").await
    }

    /// Get the physically first row of a table
    #[instrument(skip(self))]
    pub async fn earliest_by_id(&self, table: Table) -> DbResult<Option<PowerRow>> {
        self.fetch_one_ordered(table, "id ASC").await
    }

    /// Get the row with the greatest timestamp
    #[instrument(skip(self))]
    pub async fn newest_by_timestamp(&self, table: Table) -> DbResult<Option<PowerRow>> {
        self.fetch_one_ordered(table, "timestamp DESC, id DESC").await
    }

    /// Get rows with `start <= timestamp < end`
    #[instrument(skip(self))]
    pub async fn select_range(
        &self,
        table: Table,
        start: &Timestamp,
        end: &Timestamp,
    ) -> DbResult<Vec<PowerRow>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM {table}
            WHERE timestamp >= ? AND timestamp < ?
            ORDER BY timestamp ASC, id ASC"
        );
        let rows = sqlx::query_as::<_, PowerRow>(&sql)
            .bind(format_timestamp(start))
            .bind(format_timestamp(end))
            .fetch_all(self.pool())
            .await?;

        debug!("Retrieved {} {} rows", rows.len(), table);
        Ok(rows)
    }

    /// Get the first row after `after` carrying any non-zero value
    #[instrument(skip(self))]
    pub async fn select_first_active_after(
        &self,
        table: Table,
        after: &Timestamp,
    ) -> DbResult<Option<PowerRow>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM {table}
            WHERE timestamp > ? AND (grid != 0 OR solar != 0 OR home != 0)
            ORDER BY timestamp ASC, id ASC
            LIMIT 1"
        );
        let row = sqlx::query_as::<_, PowerRow>(&sql)
            .bind(format_timestamp(after))
            .fetch_optional(self.pool())
            .await?;
        Ok(row)
    }

    /// Insert records in one transaction; either all rows land or none do
    #[instrument(skip(self, records), fields(rows = records.len()))]
    pub async fn insert_batch(&self, table: Table, records: &[PowerRecord]) -> DbResult<()> {
        let sql = format!("INSERT INTO {table} (timestamp, grid, solar, home) VALUES (?, ?, ?, ?)");
        let mut tx = self.pool().begin().await?;
        for record in records {
            sqlx::query(&sql)
                .bind(format_timestamp(&record.timestamp))
                .bind(record.grid)
                .bind(record.solar)
                .bind(record.home)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        debug!("Inserted {} rows into {}", records.len(), table);
        Ok(())
    }

    /// Get count of rows in a table
    #[instrument(skip(self))]
    pub async fn count_rows(&self, table: Table) -> DbResult<i64> {
        let row = sqlx::query(&format!("SELECT COUNT(*) as count FROM {table}"))
            .fetch_one(self.pool())
            .await?;

        Ok(row.get("count"))
    }

    /// Delete every row of a table
    pub async fn clear_table(&self, table: Table) -> DbResult<u64> {
        self.clear_tables(&[table]).await
    }

    /// Delete every row of several tables in one transaction
    #[instrument(skip(self))]
    pub async fn clear_tables(&self, tables: &[Table]) -> DbResult<u64> {
        let mut tx = self.pool().begin().await?;
        let mut deleted = 0;
        for table in tables {
            let result = sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *tx)
                .await?;
            debug!("Deleted {} rows from {}", result.rows_affected(), table);
            deleted += result.rows_affected();
        }
        tx.commit().await?;
        Ok(deleted)
    }
}

#[async_trait::async_trait]
impl RowStore for DbClient {
    async fn last_row(&self, table: Table) -> Result<Option<StoredRow>> {
        Ok(self.latest_by_id(table).await?.map(StoredRow::from))
    }

    async fn first_row(&self, table: Table) -> Result<Option<StoredRow>> {
        Ok(self.earliest_by_id(table).await?.map(StoredRow::from))
    }

    async fn newest_row(&self, table: Table) -> Result<Option<StoredRow>> {
        Ok(self.newest_by_timestamp(table).await?.map(StoredRow::from))
    }

    async fn rows_in_range(
        &self,
        table: Table,
        start: &Timestamp,
        end: &Timestamp,
    ) -> Result<Vec<StoredRow>> {
        let rows = self.select_range(table, start, end).await?;
        Ok(rows.into_iter().map(StoredRow::from).collect())
    }

    async fn first_active_after(
        &self,
        table: Table,
        after: &Timestamp,
    ) -> Result<Option<StoredRow>> {
        Ok(self
            .select_first_active_after(table, after)
            .await?
            .map(StoredRow::from))
    }

    async fn append_batch(&self, table: Table, rows: &[PowerRecord]) -> Result<()> {
        Ok(self.insert_batch(table, rows).await?)
    }
}
