//! Write operations: authorized create and delete.
//!
//! Each write checks the credential first, so a rejected caller never
//! reaches the store. The store lock is released before the notifier runs.

use std::sync::Arc;

use tracing::{info, warn};

use weather_types::{Observation, ObservationDraft};

use crate::auth::Authorizer;
use crate::error::Result;
use crate::notifier::{EVENT_CREATE, EVENT_DELETE, Notifier};
use crate::state::SharedStore;

/// Validates, stores and announces new observations.
#[derive(Clone)]
pub struct IngestService {
    store: SharedStore,
    notifier: Arc<dyn Notifier>,
    authorizer: Arc<dyn Authorizer>,
}

impl IngestService {
    pub fn new(
        store: SharedStore,
        notifier: Arc<dyn Notifier>,
        authorizer: Arc<dyn Authorizer>,
    ) -> Self {
        Self {
            store,
            notifier,
            authorizer,
        }
    }

    /// Check `credential` without writing anything.
    pub fn authorize(&self, credential: Option<&str>) -> Result<()> {
        self.authorizer.authorize(credential).map_err(|e| {
            warn!("Rejected write: {}", e);
            e.into()
        })
    }

    /// Store `draft` under a fresh id and broadcast it as `"create"`.
    ///
    /// The returned record carries the measurements exactly as submitted.
    pub async fn create(&self, credential: Option<&str>, draft: &ObservationDraft) -> Result<Observation> {
        self.authorize(credential)?;
        draft.validate()?;

        let stored = {
            let mut store = self.store.lock().await;
            store.insert(draft)?
        };

        info!("Created observation {} at {}", stored.id, stored.location_name);
        self.notifier.broadcast(EVENT_CREATE, &stored);
        Ok(stored)
    }

    /// Remove an observation and broadcast it as `"delete"`.
    pub async fn delete(&self, credential: Option<&str>, id: i64) -> Result<Observation> {
        self.authorize(credential)?;

        let removed = {
            let mut store = self.store.lock().await;
            store.delete(id)?
        };

        info!("Deleted observation {}", removed.id);
        self.notifier.broadcast(EVENT_DELETE, &removed);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use time::macros::datetime;
    use tokio::sync::Mutex;
    use weather_store::{MemoryStore, ObservationQuery, ObservationStore, Store};

    use super::*;
    use crate::auth::{ApiKeyAuthorizer, AuthError};
    use crate::notifier::BroadcastNotifier;
    use crate::error::ServiceError;

    const KEY: &str = "test-key-0123456789";

    /// Records every broadcast and checks the store lock is free while it runs.
    struct RecordingNotifier {
        store: SharedStore,
        events: StdMutex<Vec<(String, i64)>>,
    }

    impl Notifier for RecordingNotifier {
        fn broadcast(&self, event: &str, observation: &Observation) {
            assert!(self.store.try_lock().is_ok(), "store locked during broadcast");
            self.events
                .lock()
                .unwrap()
                .push((event.to_string(), observation.id));
        }
    }

    fn setup(store: MemoryStore) -> (IngestService, SharedStore, Arc<RecordingNotifier>) {
        let shared: SharedStore = Arc::new(Mutex::new(Box::new(store)));
        let notifier = Arc::new(RecordingNotifier {
            store: Arc::clone(&shared),
            events: StdMutex::new(Vec::new()),
        });
        let service = IngestService::new(
            Arc::clone(&shared),
            notifier.clone(),
            Arc::new(ApiKeyAuthorizer::new([KEY])),
        );
        (service, shared, notifier)
    }

    fn draft() -> ObservationDraft {
        ObservationDraft::builder()
            .time(datetime!(2020-10-10 10:10:10 UTC))
            .temperature(11.11)
            .humidity(22.22)
            .air_pressure(33.33)
            .description("Interesting observation")
            .location_name("Aarhus")
            .coordinates(44.44, 55.55)
            .build()
    }

    #[tokio::test]
    async fn test_create_stores_and_broadcasts() {
        let (service, store, notifier) = setup(MemoryStore::new());

        let created = service.create(Some(KEY), &draft()).await.unwrap();

        assert_eq!(created.id, 1);
        assert_eq!(created.to_draft(), draft());
        assert_eq!(created.temperature, 11.11);
        assert_eq!(store.lock().await.get(1).unwrap(), created);
        assert_eq!(*notifier.events.lock().unwrap(), vec![("create".to_string(), 1)]);
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let (service, _, _) = setup(MemoryStore::new());

        let a = service.create(Some(KEY), &draft()).await.unwrap();
        let b = service.create(Some(KEY), &draft()).await.unwrap();
        assert_eq!(b.id, a.id + 1);
    }

    #[tokio::test]
    async fn test_unauthorized_create_leaves_store_untouched() {
        let (service, store, notifier) = setup(MemoryStore::new());

        let err = service.create(None, &draft()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(AuthError::Missing)));

        let err = service.create(Some("wrong-key-0000000"), &draft()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(AuthError::Invalid)));

        assert_eq!(store.lock().await.count().unwrap(), 0);
        assert!(notifier.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unauthorized_is_checked_before_validation() {
        let (service, _, _) = setup(MemoryStore::new());
        let bad = ObservationDraft::builder().temperature(f64::NAN).build();

        let err = service.create(None, &bad).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_invalid_draft_rejected() {
        let (service, store, notifier) = setup(MemoryStore::new());
        let bad = ObservationDraft::builder().humidity(f64::INFINITY).build();

        let err = service.create(Some(KEY), &bad).await.unwrap_err();
        assert!(matches!(err, ServiceError::ValidationFailed(_)));
        assert_eq!(store.lock().await.count().unwrap(), 0);
        assert!(notifier.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_not_broadcast() {
        let mut failing = MemoryStore::new();
        failing.set_failure("disk full");
        let (service, _, notifier) = setup(failing);

        let err = service.create(Some(KEY), &draft()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(_)));
        assert!(notifier.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let (service, store, notifier) = setup(MemoryStore::new());
        let created = service.create(Some(KEY), &draft()).await.unwrap();

        let removed = service.delete(Some(KEY), created.id).await.unwrap();
        assert_eq!(removed, created);
        assert!(store.lock().await.scan(&ObservationQuery::new()).unwrap().is_empty());
        assert_eq!(notifier.events.lock().unwrap().last().unwrap(), &("delete".to_string(), 1));

        let err = service.delete(Some(KEY), created.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(1)));
    }

    async fn assert_concurrent_ids_unique(store: Box<dyn ObservationStore>) {
        const WRITERS: i64 = 50;

        let shared: SharedStore = Arc::new(Mutex::new(store));
        let service = IngestService::new(
            Arc::clone(&shared),
            Arc::new(BroadcastNotifier::new(8)),
            Arc::new(ApiKeyAuthorizer::new([KEY])),
        );

        let handles = (0..WRITERS).map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.create(Some(KEY), &draft()).await })
        });
        let mut ids: Vec<i64> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|joined| joined.unwrap().unwrap().id)
            .collect();

        ids.sort_unstable();
        assert_eq!(ids, (1..=WRITERS).collect::<Vec<_>>());
        assert_eq!(shared.lock().await.count().unwrap(), WRITERS as u64);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_get_distinct_ids_memory() {
        assert_concurrent_ids_unique(Box::new(MemoryStore::new())).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_get_distinct_ids_sqlite() {
        assert_concurrent_ids_unique(Box::new(Store::open_in_memory().unwrap())).await;
    }

    #[tokio::test]
    async fn test_unauthorized_delete() {
        let (service, store, _) = setup(MemoryStore::new());
        let created = service.create(Some(KEY), &draft()).await.unwrap();

        let err = service.delete(None, created.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
        assert_eq!(store.lock().await.count().unwrap(), 1);
    }
}
