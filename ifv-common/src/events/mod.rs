//! Event system for IFV
//!
//! Provides shared event definitions and EventBus for session observers.

mod session_types;

pub use session_types::{Preview, SessionState};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// IFV event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IfvEvent {
    /// Session state transitioned (or its preview was filled in)
    ///
    /// Triggers:
    /// - SSE: Re-render upload area, loading overlay, results panel
    SessionStateChanged {
        /// Submission the new state belongs to (None once cleared)
        submission_id: Option<Uuid>,
        /// State after the change
        state: SessionState,
        /// When state changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Warmup request settled (success or failure)
    ///
    /// Triggers:
    /// - SSE: Switch loading copy from "Waking up server" to "Processing"
    WarmupCompleted {
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl IfvEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            IfvEvent::SessionStateChanged { .. } => "SessionStateChanged",
            IfvEvent::WarmupCompleted { .. } => "WarmupCompleted",
        }
    }
}

/// Central event distribution bus
///
/// Uses tokio::broadcast internally:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use ifv_common::events::{EventBus, IfvEvent};
///
/// let event_bus = EventBus::new(16);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(IfvEvent::WarmupCompleted {
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<IfvEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<IfvEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: IfvEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
