//! Database schema types
//!
//! Every table shares one shape:
//! `(id INTEGER PRIMARY KEY AUTOINCREMENT, grid real, solar real, home real, timestamp text)`.
//! Existing databases written by earlier collectors must keep working, so
//! column names and types are fixed.

use serde::{Deserialize, Serialize};
use solar_core::{StoredRow, Table};
use sqlx::FromRow;

/// Row of any power table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PowerRow {
    pub id: i64,
    pub grid: f64,
    pub solar: f64,
    pub home: f64,

    /// ISO-8601 text with UTC offset
    pub timestamp: String,
}

impl From<PowerRow> for StoredRow {
    fn from(row: PowerRow) -> Self {
        StoredRow {
            id: row.id,
            grid: row.grid,
            solar: row.solar,
            home: row.home,
            timestamp: row.timestamp,
        }
    }
}

/// Column list used by every select
pub const COLUMNS: &str = "id, grid, solar, home, timestamp";

/// DDL for one table and its timestamp index
pub fn create_statements(table: Table) -> [String; 2] {
    let name = table.name();
    [
        format!(
            "CREATE TABLE IF NOT EXISTS {name} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                grid real,
                solar real,
                home real,
                timestamp text
            )"
        ),
        format!("CREATE INDEX IF NOT EXISTS idx_{name}_timestamp ON {name} (timestamp)"),
    ]
}
