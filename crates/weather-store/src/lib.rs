//! Record store for weather observations.
//!
//! This crate provides the [`ObservationStore`] abstraction the service is
//! written against, together with two implementations:
//!
//! - [`Store`]: SQLite-backed, the default for deployments
//! - [`MemoryStore`]: in-memory, for tests and throwaway instances
//!
//! # Features
//!
//! - Store-assigned, monotonic ids that are never reused
//! - Lookup by id with an explicit not-found error
//! - Time-range scans with deterministic newest-first ordering
//! - Deletion
//!
//! # Example
//!
//! ```no_run
//! use weather_store::{ObservationQuery, ObservationStore, Store};
//!
//! let store = Store::open_default()?;
//!
//! let latest = store.scan(&ObservationQuery::new().limit(3))?;
//! # Ok::<(), weather_store::Error>(())
//! ```

mod error;
mod memory;
mod queries;
mod schema;
mod store;
mod traits;

pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use queries::ObservationQuery;
pub use store::Store;
pub use traits::ObservationStore;

/// Default database path following platform conventions.
///
/// - Linux: `~/.local/share/weather/observations.db`
/// - macOS: `~/Library/Application Support/weather/observations.db`
/// - Windows: `C:\Users\<user>\AppData\Local\weather\observations.db`
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("weather")
        .join("observations.db")
}
