//! Error types for weather-store.

use std::path::PathBuf;

/// Result type for weather-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in weather-store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database error from SQLite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to create database directory.
    #[error("Failed to create database directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// No observation has this id.
    #[error("Observation not found: {0}")]
    ObservationNotFound(i64),

    /// Timestamp cannot be stored or read back.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// The backing store is unavailable (used by test doubles).
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
