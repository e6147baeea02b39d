//! Event types and EventBus for the slideshow playback core
//!
//! The playback core uses hybrid communication:
//! - **EventBus** (tokio::broadcast): one-to-many notification of playback
//!   facts (item shown, item deleted, player switched)
//! - **Shared state** (`Arc<RwLock<T>>`): read-heavy observable state
//!
//! Deletion fan-out is performed by explicit orchestrator method calls
//! *before* the corresponding event is emitted, so subscribers observe a
//! deterministic ordering.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Playback state of the active player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Playing,
    Paused,
    Stopped,
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
            PlaybackState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Identifies one of the four interchangeable player strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerName {
    Filesystem,
    Database,
    Pinned,
    History,
}

impl std::fmt::Display for PlayerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerName::Filesystem => write!(f, "filesystem"),
            PlayerName::Database => write!(f, "database"),
            PlayerName::Pinned => write!(f, "pinned"),
            PlayerName::History => write!(f, "history"),
        }
    }
}

/// Playback events broadcast via the EventBus
///
/// Events are serializable so an outer transport layer (out of scope here)
/// can forward them to connected UIs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    /// Playback state changed (Playing ↔ Paused ↔ Stopped)
    PlaybackStateChanged {
        old_state: PlaybackState,
        new_state: PlaybackState,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An item finished its transition and is now displayed
    ItemShown {
        src: String,
        player: PlayerName,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An item was deleted out-of-band; strategies have already been notified
    ItemDeleted {
        src: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The active player strategy changed
    PlayerSwitched {
        from: Option<PlayerName>,
        to: PlayerName,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The loop engine reached 100% and automatic advancement begins
    LoopCompleted {
        src: Option<String>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl PlayerEvent {
    /// Event type name for logging and transport routing
    pub fn event_type(&self) -> &'static str {
        match self {
            PlayerEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            PlayerEvent::ItemShown { .. } => "ItemShown",
            PlayerEvent::ItemDeleted { .. } => "ItemDeleted",
            PlayerEvent::PlayerSwitched { .. } => "PlayerSwitched",
            PlayerEvent::LoopCompleted { .. } => "LoopCompleted",
        }
    }
}

/// One-to-many event broadcasting for playback components
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PlayerEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` when nobody is listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: PlayerEvent,
    ) -> Result<usize, broadcast::error::SendError<PlayerEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring whether anyone is listening
    ///
    /// Used for non-critical notifications (progress-style events).
    pub fn emit_lossy(&self, event: PlayerEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}
