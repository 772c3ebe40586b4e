//! Event types for the artfind event system
//!
//! Provides shared event definitions and the EventBus used by the UI module
//! to stream session progress to connected browsers via SSE.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Artfind event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
/// Session state is carried as its wire string (UPPERCASE) so the event
/// vocabulary does not depend on module-internal types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ArtfindEvent {
    /// A new search session was created
    SessionCreated {
        session_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Session moved between states (Idle, FileSelected, PaletteLoading, ...)
    SessionStateChanged {
        session_id: Uuid,
        old_state: String,
        new_state: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Palette extraction finished; color_count may be 0 on degradation
    PaletteExtracted {
        session_id: Uuid,
        color_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A similarity search was submitted to the backend
    SearchStarted {
        session_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Search results arrived and replaced the session's result set
    SearchCompleted {
        session_id: Uuid,
        result_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Search failed; results were cleared and the session returned to an
    /// interactive state
    SearchFailed {
        session_id: Uuid,
        error_message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A weight edit was rejected because it would push the total over 100
    WeightRejected {
        session_id: Uuid,
        feature: String,
        attempted_total: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Session discarded; retained image payload released
    SessionDiscarded {
        session_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl ArtfindEvent {
    /// SSE event name for this event
    pub fn event_type(&self) -> &'static str {
        match self {
            ArtfindEvent::SessionCreated { .. } => "SessionCreated",
            ArtfindEvent::SessionStateChanged { .. } => "SessionStateChanged",
            ArtfindEvent::PaletteExtracted { .. } => "PaletteExtracted",
            ArtfindEvent::SearchStarted { .. } => "SearchStarted",
            ArtfindEvent::SearchCompleted { .. } => "SearchCompleted",
            ArtfindEvent::SearchFailed { .. } => "SearchFailed",
            ArtfindEvent::WeightRejected { .. } => "WeightRejected",
            ArtfindEvent::SessionDiscarded { .. } => "SessionDiscarded",
        }
    }
}

/// Broadcast bus for artfind events
///
/// Wraps a `tokio::sync::broadcast` channel. Slow subscribers lose old
/// events rather than blocking emitters.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ArtfindEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<ArtfindEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: ArtfindEvent,
    ) -> Result<usize, broadcast::error::SendError<ArtfindEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: ArtfindEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("Event emitted with no subscribers");
        }
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
