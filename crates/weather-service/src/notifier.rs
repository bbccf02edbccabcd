//! Fan-out of observation events to real-time subscribers.
//!
//! # Delivery
//!
//! [`BroadcastNotifier`] is backed by a `tokio::sync::broadcast` channel:
//!
//! - **Non-blocking**: `broadcast` never waits for subscribers
//! - **No replay**: a subscriber only sees events sent after it subscribed
//! - **Lossy**: a subscriber more than `capacity` events behind skips the
//!   events it missed
//!
//! Sending with no subscribers is not an error.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use weather_types::Observation;

/// Event name sent after an observation is created.
pub const EVENT_CREATE: &str = "create";
/// Event name sent after an observation is deleted.
pub const EVENT_DELETE: &str = "delete";

/// A named event carrying a full observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationEvent {
    pub event: String,
    pub data: Observation,
}

/// Delivers observation events to whoever is listening.
///
/// Implementations must return promptly and must not fail the caller.
pub trait Notifier: Send + Sync {
    fn broadcast(&self, event: &str, observation: &Observation);
}

/// [`Notifier`] backed by a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<ObservationEvent>,
}

impl BroadcastNotifier {
    /// Create a notifier that buffers up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to events sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ObservationEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Notifier for BroadcastNotifier {
    fn broadcast(&self, event: &str, observation: &Observation) {
        let message = ObservationEvent {
            event: event.to_string(),
            data: observation.clone(),
        };
        match self.tx.send(message) {
            Ok(n) => debug!("Sent '{}' for observation {} to {} subscribers", event, observation.id, n),
            Err(_) => debug!("No subscribers for '{}' event", event),
        }
    }
}
