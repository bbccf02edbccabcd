//! Request plumbing shared by the handlers.
//!
//! This module provides:
//! - Credential extraction from request headers
//! - Per-client limits on write requests

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::RwLock;
use tracing::warn;

use crate::config::SecurityConfig;

/// Header carrying an API key as an alternative to `Authorization`.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// The credential presented with a request, if any.
///
/// `Authorization: Bearer <key>` wins over `X-API-Key: <key>`.
pub fn extract_credential(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    bearer
        .or_else(|| {
            headers
                .get(API_KEY_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
        })
        .filter(|k| !k.is_empty())
}

/// Per-client budget for write requests.
///
/// Reads and the WebSocket feed are never counted; only methods that can
/// change the store (`POST`, `PUT`, `PATCH`, `DELETE`) draw from the budget.
/// Each client IP gets `max_writes` per fixed window.
#[derive(Debug)]
pub struct WriteLimiter {
    max_writes: u32,
    window: Duration,
    clients: RwLock<HashMap<IpAddr, WriteWindow>>,
}

#[derive(Debug, Clone, Copy)]
struct WriteWindow {
    opened: Instant,
    writes: u32,
}

/// A write refused because the client used up its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteRejected {
    pub limit: u32,
    pub retry_after_secs: u64,
}

impl WriteLimiter {
    pub fn new(max_writes: u32, window: Duration) -> Self {
        Self {
            max_writes,
            window,
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Limiter configured from the `[security]` section.
    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(
            config.rate_limit_requests,
            Duration::from_secs(config.rate_limit_window_secs),
        )
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Charge one write to `client` at `now`.
    pub async fn charge(&self, client: IpAddr, now: Instant) -> Result<(), WriteRejected> {
        let mut clients = self.clients.write().await;
        let slot = clients.entry(client).or_insert(WriteWindow {
            opened: now,
            writes: 0,
        });

        let elapsed = now.saturating_duration_since(slot.opened);
        if elapsed >= self.window {
            *slot = WriteWindow {
                opened: now,
                writes: 0,
            };
        }

        if slot.writes >= self.max_writes {
            let remaining = self.window.saturating_sub(now.saturating_duration_since(slot.opened));
            return Err(WriteRejected {
                limit: self.max_writes,
                retry_after_secs: remaining.as_secs().max(1),
            });
        }

        slot.writes += 1;
        Ok(())
    }

    /// Forget clients whose window closed before `now`.
    pub async fn forget_idle(&self, now: Instant) {
        let window = self.window;
        self.clients
            .write()
            .await
            .retain(|_, slot| now.saturating_duration_since(slot.opened) < window);
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.clients.read().await.len()
    }
}

fn is_write(method: &Method) -> bool {
    [Method::POST, Method::PUT, Method::PATCH, Method::DELETE].contains(method)
}

/// Write-limiting middleware.
///
/// Answers 429 Too Many Requests with `Retry-After` once a client has used
/// its write budget. Needs the router to be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub async fn limit_writes(
    ConnectInfo(addr): ConnectInfo<std::net::SocketAddr>,
    State(limiter): State<Arc<WriteLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    if !is_write(request.method()) {
        return next.run(request).await;
    }

    match limiter.charge(addr.ip(), Instant::now()).await {
        Ok(()) => next.run(request).await,
        Err(rejected) => {
            warn!(
                "Write limit of {} reached for {} on {} {}",
                rejected.limit,
                addr.ip(),
                request.method(),
                request.uri().path()
            );
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, rejected.retry_after_secs.to_string())],
                Json(serde_json::json!({
                    "error": format!("too many writes; at most {} per window", rejected.limit),
                })),
            )
                .into_response()
        }
    }
}
