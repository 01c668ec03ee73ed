//! Database client and connection management

use crate::{DbError, DbResult};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Database client wrapping a sqlx SQLite pool
#[derive(Clone)]
pub struct DbClient {
    pool: SqlitePool,
}

impl DbClient {
    /// Open (creating if needed) the database file at `path`
    pub async fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Self::with_options(DbConnectionBuilder::new(path.as_ref()).build()?).await
    }

    /// Create a new database client with custom options
    pub async fn with_options(opts: SqliteConnectOptions) -> DbResult<Self> {
        // One writer; the engine never overlaps queries.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(opts)
            .await?;

        Ok(Self { pool })
    }

    /// Get reference to underlying pool for direct queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Test the database connection
    pub async fn ping(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close the connection pool gracefully
    pub async fn close(self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}

/// Build SQLite connection options for a database file
pub struct DbConnectionBuilder {
    path: PathBuf,
    create_if_missing: bool,
    busy_timeout: Duration,
    wal: bool,
}

impl DbConnectionBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            create_if_missing: true,
            busy_timeout: Duration::from_secs(5),
            wal: true,
        }
    }

    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    pub fn wal(mut self, wal: bool) -> Self {
        self.wal = wal;
        self
    }

    pub fn build(self) -> DbResult<SqliteConnectOptions> {
        if self.path.as_os_str().is_empty() {
            return Err(DbError::ConfigError("empty database path".to_string()));
        }

        let journal = if self.wal {
            SqliteJournalMode::Wal
        } else {
            SqliteJournalMode::Delete
        };

        Ok(SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(self.create_if_missing)
            .busy_timeout(self.busy_timeout)
            .journal_mode(journal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_builder_rejects_empty_path() {
        let result = DbConnectionBuilder::new("").build();
        assert!(matches!(result, Err(DbError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_open_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solarlogging.db");

        let client = DbClient::open(&path).await.unwrap();
        client.ping().await.unwrap();
        client.close().await;

        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_open_without_create_fails_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let opts = DbConnectionBuilder::new(dir.path().join("missing.db"))
            .create_if_missing(false)
            .wal(false)
            .build()
            .unwrap();

        assert!(DbClient::with_options(opts).await.is_err());
    }
}
