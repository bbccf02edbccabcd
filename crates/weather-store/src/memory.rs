//! In-memory observation store.
//!
//! [`MemoryStore`] implements [`ObservationStore`] over a `BTreeMap`, so it
//! can stand in for the SQLite store in tests and ephemeral deployments.
//!
//! # Features
//!
//! - **Failure injection**: make every operation fail with
//!   [`Error::Unavailable`] to exercise error paths in callers

use std::collections::BTreeMap;

use weather_types::{Observation, ObservationDraft};

use crate::error::{Error, Result};
use crate::queries::ObservationQuery;
use crate::traits::ObservationStore;

/// An observation store kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    observations: BTreeMap<i64, Observation>,
    last_id: i64,
    fail_message: Option<String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with `message`.
    pub fn set_failure(&mut self, message: impl Into<String>) {
        self.fail_message = Some(message.into());
    }

    /// Stop injecting failures.
    pub fn clear_failure(&mut self) {
        self.fail_message = None;
    }

    fn check(&self) -> Result<()> {
        match &self.fail_message {
            Some(msg) => Err(Error::Unavailable(msg.clone())),
            None => Ok(()),
        }
    }
}

impl ObservationStore for MemoryStore {
    fn insert(&mut self, draft: &ObservationDraft) -> Result<Observation> {
        self.check()?;
        self.last_id += 1;
        let observation = Observation::from_draft(self.last_id, draft);
        self.observations.insert(observation.id, observation.clone());
        Ok(observation)
    }

    fn get(&self, id: i64) -> Result<Observation> {
        self.check()?;
        self.observations
            .get(&id)
            .cloned()
            .ok_or(Error::ObservationNotFound(id))
    }

    fn scan(&self, query: &ObservationQuery) -> Result<Vec<Observation>> {
        self.check()?;
        Ok(query.apply(self.observations.values()))
    }

    fn delete(&mut self, id: i64) -> Result<Observation> {
        self.check()?;
        self.observations
            .remove(&id)
            .ok_or(Error::ObservationNotFound(id))
    }

    fn count(&self) -> Result<u64> {
        self.check()?;
        Ok(self.observations.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;
    use time::macros::datetime;

    #[test]
    fn test_insert_and_get() {
        let mut store = MemoryStore::new();
        let draft = ObservationDraft::builder().location_name("Aarhus").build();

        let stored = store.insert(&draft).unwrap();
        assert_eq!(stored.id, 1);
        assert_eq!(store.get(1).unwrap(), stored);
    }

    #[test]
    fn test_ids_monotonic_across_delete() {
        let mut store = MemoryStore::new();
        let draft = ObservationDraft::default();

        let a = store.insert(&draft).unwrap();
        store.delete(a.id).unwrap();
        let b = store.insert(&draft).unwrap();

        assert_eq!(b.id, a.id + 1);
        assert!(matches!(store.get(a.id), Err(Error::ObservationNotFound(1))));
    }

    #[test]
    fn test_scan_uses_query_order() {
        let mut store = MemoryStore::new();
        let t = datetime!(2020-10-10 10:10:10 UTC);
        store
            .insert(&ObservationDraft::builder().time(t + Duration::hours(1)).build())
            .unwrap();
        store.insert(&ObservationDraft::builder().time(t).build()).unwrap();

        let found = store.scan(&ObservationQuery::new()).unwrap();
        assert_eq!(found[0].id, 1);
        assert_eq!(found[1].id, 2);
    }

    #[test]
    fn test_failure_injection() {
        let mut store = MemoryStore::new();
        store.set_failure("disk on fire");

        let err = store.insert(&ObservationDraft::default()).unwrap_err();
        assert!(err.to_string().contains("disk on fire"));
        assert!(store.scan(&ObservationQuery::new()).is_err());

        store.clear_failure();
        assert_eq!(store.count().unwrap(), 0);
    }
}
