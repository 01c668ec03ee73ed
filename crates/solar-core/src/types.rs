//! Core data types for power-flow records

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type (ISO-8601 with a UTC offset, as stored in every table)
pub type Timestamp = DateTime<FixedOffset>;

/// Parse a stored timestamp. Rows without an explicit offset are rejected.
pub fn parse_timestamp(raw: &str) -> Result<Timestamp, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw)
}

/// Render a timestamp the way it is persisted (`2024-03-01T10:05:00+00:00`)
pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// One power-flow reading or summary.
///
/// The same shape is used for raw samples (instantaneous power), daily
/// records (kWh) and every aggregate table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerRecord {
    pub timestamp: Timestamp,

    /// Signed grid power; negative values are export
    pub grid: f64,

    pub solar: f64,

    /// Household consumption; may be negative when the site is net exporting
    pub home: f64,
}

impl PowerRecord {
    pub fn new(timestamp: Timestamp, grid: f64, solar: f64, home: f64) -> Self {
        Self {
            timestamp,
            grid,
            solar,
            home,
        }
    }

    /// Whether the row can lift a slot total above zero. Grid export is
    /// clipped, so a row with only negative or zero fields never does.
    pub fn contributes(&self) -> bool {
        self.grid > 0.0 || self.solar > 0.0 || self.home > 0.0
    }
}

/// A row as it physically exists in the store, timestamp still unparsed
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    pub id: i64,
    pub grid: f64,
    pub solar: f64,
    pub home: f64,
    pub timestamp: String,
}

impl StoredRow {
    pub fn parse(&self) -> Result<PowerRecord, chrono::ParseError> {
        Ok(PowerRecord {
            timestamp: parse_timestamp(&self.timestamp)?,
            grid: self.grid,
            solar: self.solar,
            home: self.home,
        })
    }
}

/// Tables known to the row store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Samples,
    Daily,
    FiveMinute,
    Hourly,
    Weekly,
    Monthly,
}

impl Table {
    pub const ALL: [Table; 6] = [
        Table::Samples,
        Table::Daily,
        Table::FiveMinute,
        Table::Hourly,
        Table::Weekly,
        Table::Monthly,
    ];

    /// Table name as used in SQL
    pub fn name(self) -> &'static str {
        match self {
            Table::Samples => "samples",
            Table::Daily => "daily",
            Table::FiveMinute => "fiveminute",
            Table::Hourly => "hourly",
            Table::Weekly => "weekly",
            Table::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_roundtrip_keeps_offset() {
        let ts = parse_timestamp("2024-03-01T10:05:00+00:00").unwrap();
        assert_eq!(format_timestamp(&ts), "2024-03-01T10:05:00+00:00");

        let ts = parse_timestamp("2024-03-01T10:05:00.250+10:00").unwrap();
        assert_eq!(format_timestamp(&ts), "2024-03-01T10:05:00.250+10:00");
    }

    #[test]
    fn test_timestamp_requires_offset() {
        assert!(parse_timestamp("2024-03-01T10:05:00").is_err());
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_stored_row_parse() {
        let row = StoredRow {
            id: 7,
            grid: -5.0,
            solar: 2.0,
            home: 3.0,
            timestamp: "2024-03-01T10:05:00+00:00".to_string(),
        };
        let record = row.parse().unwrap();
        assert_eq!(record.grid, -5.0);
        assert!(record.contributes());

        let zero = PowerRecord::new(record.timestamp, 0.0, 0.0, 0.0);
        assert!(!zero.contributes());
        let export = PowerRecord::new(record.timestamp, -5.0, 0.0, -1.0);
        assert!(!export.contributes());
    }

    #[test]
    fn test_table_names() {
        assert_eq!(Table::FiveMinute.name(), "fiveminute");
        assert_eq!(Table::Daily.to_string(), "daily");
    }
}
