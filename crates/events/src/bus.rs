//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] carries [`CacheEvent`]s from the notes cache to whoever
//! renders it. It is shared via `Arc<EventBus>`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// MutationKind
// ---------------------------------------------------------------------------

/// The three write operations on the notes collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl MutationKind {
    pub const ALL: [MutationKind; 3] = [Self::Create, Self::Update, Self::Delete];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CacheEvent
// ---------------------------------------------------------------------------

/// What changed in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CacheEventKind {
    /// The visible snapshot was replaced, patched or rolled back.
    SnapshotChanged { revision: u64, len: usize },
    /// A list fetch was started.
    FetchStarted { generation: u64 },
    /// The latest list fetch failed; the previous data is kept.
    FetchFailed { message: String },
    MutationStarted { kind: MutationKind },
    /// A mutation finished, including its reconciliation.
    MutationSettled { kind: MutationKind, ok: bool },
    /// All cached data was dropped.
    Reset,
}

/// A timestamped cache state change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEvent {
    #[serde(flatten)]
    pub kind: CacheEventKind,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl CacheEvent {
    pub fn new(kind: CacheEventKind) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
        }
    }

    /// Dot-separated event name, e.g. `"notes.fetch_failed"`.
    pub fn event_type(&self) -> &'static str {
        match self.kind {
            CacheEventKind::SnapshotChanged { .. } => "notes.snapshot_changed",
            CacheEventKind::FetchStarted { .. } => "notes.fetch_started",
            CacheEventKind::FetchFailed { .. } => "notes.fetch_failed",
            CacheEventKind::MutationStarted { .. } => "notes.mutation_started",
            CacheEventKind::MutationSettled { .. } => "notes.mutation_settled",
            CacheEventKind::Reset => "notes.reset",
        }
    }
}

impl From<CacheEventKind> for CacheEvent {
    fn from(kind: CacheEventKind) -> Self {
        Self::new(kind)
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// # Usage
///
/// ```rust
/// use pocketnotes_events::bus::{CacheEventKind, EventBus};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(CacheEventKind::Reset);
/// ```
pub struct EventBus {
    sender: broadcast::Sender<CacheEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: impl Into<CacheEvent>) {
        let event = event.into();
        tracing::trace!(event_type = event.event_type(), "Publishing cache event");
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
