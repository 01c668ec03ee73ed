//! SQLite row store for solar power logging
//!
//! Reads the `samples` and `daily` tables written by the collectors and
//! appends to the four summary tables. Schema bootstrap is idempotent; an
//! existing database is used as-is, no migrations.

pub mod client;
pub mod queries;
pub mod schema;

pub use client::*;
pub use schema::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

pub type DbResult<T> = Result<T, DbError>;
