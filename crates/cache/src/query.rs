//! Read-side view of the cache.

use pocketnotes_core::note::Note;

/// Status of the notes query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// No data yet and no error.
    Loading,
    /// The last fetch failed. Previously fetched data is kept.
    Error,
    Success,
}

/// What a screen sees when it reads the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    /// Current snapshot, newest first. `None` until the first fetch lands.
    pub data: Option<Vec<Note>>,
    pub status: QueryStatus,
    /// Message of the last failed fetch.
    pub error_message: Option<String>,
    /// A list fetch is in flight.
    pub is_fetching: bool,
    /// The snapshot is known to lag the backend.
    pub is_stale: bool,
    /// Incremented on every snapshot change.
    pub revision: u64,
}

impl QueryResult {
    /// Notes in the snapshot, or an empty slice while loading.
    pub fn notes(&self) -> &[Note] {
        self.data.as_deref().unwrap_or_default()
    }

    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    /// Number of unconfirmed optimistic entries.
    pub fn placeholder_count(&self) -> usize {
        self.notes().iter().filter(|n| n.is_placeholder()).count()
    }
}
