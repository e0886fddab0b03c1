//! Session event types and EventBus
//!
//! The autocomplete session publishes every state transition here so a
//! presentation layer can re-render without polling.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Autocomplete session events
///
/// Events carry only summary data; subscribers read the session snapshot for
/// full results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// Raw input term changed (emitted on every `set_term`)
    TermChanged {
        session_id: Uuid,
        term: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A debounced search was dispatched to the remote service
    SearchStarted {
        session_id: Uuid,
        /// Dispatch sequence number
        sequence: u64,
        term: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Search response applied; results replaced
    ResultsUpdated {
        session_id: Uuid,
        sequence: u64,
        /// Number of predictions now held
        count: usize,
        /// Status string returned by the remote service
        status: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Search failed; previous results kept
    SearchFailed {
        session_id: Uuid,
        /// Sequence of the failed search, or `0` if it was never dispatched
        sequence: u64,
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Results emptied (short term or explicit clear)
    ResultsCleared {
        session_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Session torn down; no further events follow
    SessionClosed {
        session_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl SessionEvent {
    /// Session that produced this event
    pub fn session_id(&self) -> Uuid {
        match self {
            SessionEvent::TermChanged { session_id, .. }
            | SessionEvent::SearchStarted { session_id, .. }
            | SessionEvent::ResultsUpdated { session_id, .. }
            | SessionEvent::SearchFailed { session_id, .. }
            | SessionEvent::ResultsCleared { session_id, .. }
            | SessionEvent::SessionClosed { session_id, .. } => *session_id,
        }
    }
}

/// Broadcast channel for session events
///
/// Cheap to clone; all clones share the same channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Slow subscribers lose the oldest events once `capacity` is exceeded.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }
}
