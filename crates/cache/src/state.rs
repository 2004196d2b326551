//! The snapshot and fetch bookkeeping behind the cache lock.
//!
//! Every method here runs under the cache's `std::sync::Mutex` and never
//! awaits, so each one is atomic to readers.

use futures::future::{BoxFuture, Shared};
use pocketnotes_core::error::NoteError;
use pocketnotes_core::note::Note;
use tokio_util::sync::CancellationToken;

use crate::query::{QueryResult, QueryStatus};

pub(crate) type FetchResult = Result<Vec<Note>, NoteError>;

/// One list fetch, awaitable by any number of callers.
pub(crate) type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

pub(crate) struct InFlightFetch {
    pub generation: u64,
    pub cancel: CancellationToken,
    pub fetch: SharedFetch,
}

/// The snapshot as it was before an optimistic patch.
#[derive(Debug)]
pub(crate) struct RollbackPoint {
    epoch: u64,
    snapshot: Option<Vec<Note>>,
}

impl RollbackPoint {
    /// The reset epoch the patch was applied in.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// What a completed fetch changed.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum FetchOutcome {
    Replaced { revision: u64, len: usize },
    Failed { message: String },
    /// The fetch was superseded; nothing changed.
    Fenced,
}

#[derive(Default)]
pub(crate) struct CacheState {
    snapshot: Option<Vec<Note>>,
    error: Option<String>,
    stale: bool,
    revision: u64,
    /// Bumped when a fetch starts and when one is superseded. Only the
    /// fetch holding the current value may write its result.
    generation: u64,
    /// Bumped by [`clear`](Self::clear). Rollbacks and reconciliations from
    /// an earlier epoch must not touch the snapshot.
    epoch: u64,
    in_flight: Option<InFlightFetch>,
}

impl CacheState {
    pub fn query(&self) -> QueryResult {
        let status = match (&self.snapshot, &self.error) {
            (_, Some(_)) => QueryStatus::Error,
            (None, None) => QueryStatus::Loading,
            (Some(_), None) => QueryStatus::Success,
        };
        QueryResult {
            data: self.snapshot.clone(),
            status,
            error_message: self.error.clone(),
            is_fetching: self.in_flight.is_some(),
            is_stale: self.stale,
            revision: self.revision,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.snapshot.as_ref().map_or(0, Vec::len)
    }

    pub fn find(&self, id: &str) -> Option<Note> {
        self.snapshot
            .as_ref()?
            .iter()
            .find(|n| n.id == id)
            .cloned()
    }

    /// The snapshot, if it exists and nothing marked it stale or failed.
    pub fn fresh_snapshot(&self) -> Option<Vec<Note>> {
        if self.stale || self.error.is_some() {
            return None;
        }
        self.snapshot.clone()
    }

    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    // ---- fetch bookkeeping ----

    pub fn current_fetch(&self) -> Option<SharedFetch> {
        self.in_flight.as_ref().map(|f| f.fetch.clone())
    }

    /// Reserve the generation for a new fetch.
    pub fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub fn track_fetch(&mut self, fetch: InFlightFetch) {
        debug_assert!(self.in_flight.is_none(), "at most one fetch in flight");
        self.in_flight = Some(fetch);
    }

    /// Cancel the in-flight fetch and fence its result. Returns the
    /// superseded generation.
    pub fn supersede_fetch(&mut self) -> Option<u64> {
        let fetch = self.in_flight.take()?;
        fetch.cancel.cancel();
        self.generation += 1;
        Some(fetch.generation)
    }

    /// Record the result of fetch `generation`.
    pub fn finish_fetch(&mut self, generation: u64, result: &FetchResult) -> FetchOutcome {
        if generation != self.generation {
            return FetchOutcome::Fenced;
        }
        if self
            .in_flight
            .as_ref()
            .is_some_and(|f| f.generation == generation)
        {
            self.in_flight = None;
        }

        match result {
            Ok(notes) => {
                self.snapshot = Some(notes.clone());
                self.error = None;
                self.stale = false;
                self.revision += 1;
                FetchOutcome::Replaced {
                    revision: self.revision,
                    len: notes.len(),
                }
            }
            Err(NoteError::Cancelled) => FetchOutcome::Fenced,
            Err(e) => {
                let message = e.to_string();
                self.error = Some(message.clone());
                FetchOutcome::Failed { message }
            }
        }
    }

    // ---- optimistic patches ----

    /// Capture the snapshot and patch it in one step.
    pub fn apply(&mut self, patch: impl FnOnce(&mut Vec<Note>)) -> RollbackPoint {
        let point = RollbackPoint {
            epoch: self.epoch,
            snapshot: self.snapshot.clone(),
        };
        patch(self.snapshot.get_or_insert_with(Vec::new));
        self.revision += 1;
        point
    }

    /// Restore `point`. Returns `false` without touching anything when the
    /// cache was cleared after the point was captured.
    pub fn rollback(&mut self, point: RollbackPoint) -> bool {
        if point.epoch != self.epoch {
            return false;
        }
        self.snapshot = point.snapshot;
        self.revision += 1;
        true
    }

    /// Drop everything and fence any in-flight fetch.
    pub fn clear(&mut self) {
        self.supersede_fetch();
        self.snapshot = None;
        self.error = None;
        self.stale = false;
        self.revision += 1;
        self.epoch += 1;
    }
}
