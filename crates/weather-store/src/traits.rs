//! Trait abstraction over observation record stores.
//!
//! This module provides the [`ObservationStore`] trait implemented by the
//! SQLite-backed [`Store`](crate::Store) and the in-memory
//! [`MemoryStore`](crate::MemoryStore).

use weather_types::{Observation, ObservationDraft};

use crate::error::Result;
use crate::queries::ObservationQuery;

/// An ordered collection of observations keyed by a store-assigned id.
///
/// Each call is atomic on its own; callers that share a store across tasks
/// serialize access themselves (the service wraps it in a mutex). Ids are
/// assigned by the store, increase monotonically and are never reused.
///
/// # Example
///
/// ```
/// use weather_store::{MemoryStore, ObservationQuery, ObservationStore};
/// use weather_types::ObservationDraft;
///
/// fn newest(store: &dyn ObservationStore) -> weather_store::Result<Option<i64>> {
///     let mut found = store.scan(&ObservationQuery::new().limit(1))?;
///     Ok(found.pop().map(|o| o.id))
/// }
///
/// let mut store = MemoryStore::new();
/// let stored = store.insert(&ObservationDraft::default())?;
/// assert_eq!(newest(&store)?, Some(stored.id));
/// # Ok::<(), weather_store::Error>(())
/// ```
pub trait ObservationStore: Send {
    /// Persist a draft under the next id and return the stored record.
    fn insert(&mut self, draft: &ObservationDraft) -> Result<Observation>;

    /// Look up one observation.
    ///
    /// Fails with [`Error::ObservationNotFound`](crate::Error::ObservationNotFound)
    /// when no record has this id.
    fn get(&self, id: i64) -> Result<Observation>;

    /// Return the observations matching `query`, in the query's order.
    fn scan(&self, query: &ObservationQuery) -> Result<Vec<Observation>>;

    /// Remove an observation and return it.
    ///
    /// Fails with [`Error::ObservationNotFound`](crate::Error::ObservationNotFound)
    /// when no record has this id.
    fn delete(&mut self, id: i64) -> Result<Observation>;

    /// Number of stored observations.
    fn count(&self) -> Result<u64>;
}
