//! REST API endpoints for the weather service.
//!
//! # Concurrency
//!
//! Handlers hold the store lock only for the duration of one store call,
//! taken inside [`QueryService`](crate::QueryService) or
//! [`IngestService`](crate::IngestService). Broadcasting happens after the
//! lock is released.
//!
//! ## Error Handling
//!
//! All endpoints return structured JSON errors via [`AppError`]: a missing
//! observation is 404, a refused credential 401, a malformed timestamp, date
//! or body 400, and any store failure 500.
//!
//! # Example
//!
//! ```ignore
//! use weather_service::api;
//!
//! let app = api::router().with_state(state);
//! ```

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::error;

use weather_types::timestamp::{parse_date, parse_timestamp};
use weather_types::{Observation, ObservationDraft, ParseError};

use crate::error::ServiceError;
use crate::middleware::extract_credential;
use crate::state::AppState;

/// Create the API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/health", get(health))
        // Reads
        .route("/api/observations/last3", get(last_three))
        .route("/api/observations/recent", get(recent))
        .route("/api/observations/daterange/{start}/{end}", get(date_range))
        .route("/api/observations/date/{date}", get(on_date))
        .route("/api/observations/id/{id}", get(by_id))
        // Writes
        .route("/api/observations/create", post(create))
        .route("/api/observations/{id}", delete(remove))
}

/// Path of the by-id lookup for an observation.
pub fn observation_location(id: i64) -> String {
    format!("/api/observations/id/{}", id)
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: OffsetDateTime::now_utc(),
    })
}

async fn last_three(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Observation>>, AppError> {
    Ok(Json(state.queries.recent(3).await?))
}

/// Query parameters for `/api/observations/recent`.
#[derive(Debug, Default, Deserialize)]
pub struct RecentQuery {
    /// Number of observations; the configured default when absent.
    pub count: Option<u32>,
}

async fn recent(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<Observation>>, AppError> {
    let limits = &state.config.query;
    let count = query.count.unwrap_or(limits.recent_default);
    if count == 0 || count > limits.max_recent {
        return Err(AppError::BadRequest(format!(
            "count must be between 1 and {}",
            limits.max_recent
        )));
    }
    Ok(Json(state.queries.recent(count).await?))
}

async fn date_range(
    State(state): State<Arc<AppState>>,
    Path((start, end)): Path<(String, String)>,
) -> Result<Json<Vec<Observation>>, AppError> {
    let start = parse_timestamp(&start)?;
    let end = parse_timestamp(&end)?;
    Ok(Json(state.queries.range(start, end).await?))
}

async fn on_date(
    State(state): State<Arc<AppState>>,
    Path(date): Path<String>,
) -> Result<Json<Vec<Observation>>, AppError> {
    let date = parse_date(&date)?;
    Ok(Json(state.queries.on_date(date).await?))
}

async fn by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Observation>, AppError> {
    Ok(Json(state.queries.by_id(id).await?))
}

/// Create an observation.
///
/// The credential is checked before the body, so an unauthorized caller
/// gets 401 even when the body is malformed. Any `id` in the body is ignored.
async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<ObservationDraft>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let credential = extract_credential(&headers);
    state.ingest.authorize(credential)?;

    let Json(draft) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let stored = state.ingest.create(credential, &draft).await?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, observation_location(stored.id))],
        Json(stored),
    ))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Observation>, AppError> {
    let removed = state.ingest.delete(extract_credential(&headers), id).await?;
    Ok(Json(removed))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound(_) => AppError::NotFound(e.to_string()),
            ServiceError::Unauthorized(_) => AppError::Unauthorized(e.to_string()),
            ServiceError::ValidationFailed(_) => AppError::BadRequest(e.to_string()),
            ServiceError::Store(_) => {
                error!("Store failure: {}", e);
                AppError::Internal(e.to_string())
            }
        }
    }
}

impl From<ParseError> for AppError {
    fn from(e: ParseError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, Json(body)).into_response()
    }
}
