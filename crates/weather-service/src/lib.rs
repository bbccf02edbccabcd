//! HTTP REST API and real-time feed for weather observations.
//!
//! This crate provides a service that:
//! - Stores observations submitted by authorized clients
//! - Answers most-recent, time-range, calendar-day and by-id queries
//! - Pushes every new observation to WebSocket subscribers
//! - Optional per-IP rate limiting
//!
//! # REST API Endpoints
//!
//! - `GET /api/health` - Service health check
//! - `GET /api/observations/last3` - The three latest observations
//! - `GET /api/observations/recent?count=N` - The N latest observations
//! - `GET /api/observations/daterange/{start}/{end}` - Observations in `[start, end]`
//! - `GET /api/observations/date/{date}` - Observations on one UTC day
//! - `GET /api/observations/id/{id}` - One observation
//! - `POST /api/observations/create` - Create an observation (API key required)
//! - `DELETE /api/observations/{id}` - Delete an observation (API key required)
//! - `WS /api/ws` - Real-time event stream
//!
//! # Configuration
//!
//! The service reads configuration from `~/.config/weather/server.toml`:
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8080"
//!
//! [storage]
//! path = "~/.local/share/weather/observations.db"
//!
//! [query]
//! round_measurements = true
//!
//! [security]
//! # Accepted as "Authorization: Bearer <key>" or "X-API-Key: <key>".
//! # Without keys, create and delete are always rejected.
//! api_keys = ["your-secure-random-key-at-least-16-chars"]
//!
//! rate_limit_enabled = true
//! rate_limit_requests = 100   # max requests per window
//! rate_limit_window_secs = 60 # window duration
//! ```

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod ingest;
pub mod middleware;
pub mod notifier;
pub mod query;
pub mod seed;
pub mod state;
pub mod ws;

pub use auth::{ApiKeyAuthorizer, AuthError, Authorizer};
pub use config::{Config, ConfigError, QueryConfig, SecurityConfig, ServerConfig, StorageConfig};
pub use error::ServiceError;
pub use ingest::IngestService;
pub use notifier::{BroadcastNotifier, Notifier, ObservationEvent};
pub use query::{QueryService, RoundingPolicy};
pub use state::{AppState, SharedStore};

/// Build the full application: REST API, WebSocket feed, request tracing
/// and CORS.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(api::router())
        .merge(ws::router())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
