//! Application state shared across handlers.
//!
//! # Broadcast Channel Behavior
//!
//! Real-time events go through a [`BroadcastNotifier`] whose buffer size is
//! `server.broadcast_buffer` (default: 100). A WebSocket client that falls
//! further behind than the buffer skips the events it missed; the ingest
//! path never waits for it.
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8080"
//! broadcast_buffer = 200  # Larger buffer for slow clients
//! ```

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::warn;

use weather_store::ObservationStore;

use crate::auth::ApiKeyAuthorizer;
use crate::config::Config;
use crate::ingest::IngestService;
use crate::notifier::BroadcastNotifier;
use crate::query::{QueryService, RoundingPolicy};

/// The single store instance shared by every service in the process.
pub type SharedStore = Arc<Mutex<Box<dyn ObservationStore>>>;

/// Shared application state.
pub struct AppState {
    /// Configuration the server was started with.
    pub config: Config,
    /// The observation store.
    pub store: SharedStore,
    /// Real-time event fan-out.
    pub notifier: Arc<BroadcastNotifier>,
    /// Read operations.
    pub queries: QueryService,
    /// Write operations.
    pub ingest: IngestService,
}

impl AppState {
    /// Create new application state around `store`.
    pub fn new<S>(store: S, config: Config) -> Arc<Self>
    where
        S: ObservationStore + 'static,
    {
        let store: SharedStore = Arc::new(Mutex::new(Box::new(store)));
        let notifier = Arc::new(BroadcastNotifier::new(config.server.broadcast_buffer));

        let authorizer = ApiKeyAuthorizer::new(config.security.api_keys.iter().cloned());
        if !authorizer.is_enabled() {
            warn!("No API keys configured; create and delete requests will be rejected");
        }

        let queries = QueryService::new(
            Arc::clone(&store),
            RoundingPolicy::from_flag(config.query.round_measurements),
        );
        let ingest = IngestService::new(Arc::clone(&store), notifier.clone(), Arc::new(authorizer));

        Arc::new(Self {
            config,
            store,
            notifier,
            queries,
            ingest,
        })
    }
}

#[cfg(test)]
mod tests {
    use weather_store::MemoryStore;

    use super::*;

    #[test]
    fn test_state_from_config() {
        let mut config = Config::default();
        config.query.round_measurements = false;
        config.server.broadcast_buffer = 8;

        let state = AppState::new(MemoryStore::new(), config);
        assert_eq!(state.queries.rounding(), RoundingPolicy::None);
        assert_eq!(state.notifier.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_services_share_one_store() {
        let mut config = Config::default();
        config.security.api_keys = vec!["shared-store-key-0001".to_string()];
        let state = AppState::new(MemoryStore::new(), config);

        let draft = weather_types::ObservationDraft::builder().location_name("Aarhus").build();
        let created = state
            .ingest
            .create(Some("shared-store-key-0001"), &draft)
            .await
            .unwrap();

        assert_eq!(state.queries.by_id(created.id).await.unwrap().location_name, "Aarhus");
        assert_eq!(state.store.lock().await.count().unwrap(), 1);
    }
}
