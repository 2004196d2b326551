//! [`NotesCache`]: the owned snapshot of the notes collection and the
//! optimistic mutation protocol around it.
//!
//! Creates and deletes run as a fixed sequence of steps:
//!
//! 1. cancel any in-flight list fetch,
//! 2. capture the snapshot as the rollback point and patch it (one lock),
//! 3. call the data access layer,
//! 4. on failure restore the rollback point,
//! 5. mark the snapshot stale and await a fresh list fetch.
//!
//! Updates skip the optimistic patch and reconcile only on success.
//!
//! A [`reset`](NotesCache::reset) starts a new epoch. Mutations begun
//! before it neither roll back nor refetch into the cleared cache.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use futures::FutureExt;
use pocketnotes_core::error::NoteError;
use pocketnotes_core::naming::{is_placeholder_id, placeholder_id};
use pocketnotes_core::note::{Note, NoteDraft, NotePatch};
use pocketnotes_core::validation::{validate_draft, validate_patch};
use pocketnotes_data::NoteRepo;
use pocketnotes_events::{CacheEventKind, EventBus, MutationKind};
use tokio_util::sync::CancellationToken;

use crate::mutation::MutationTracker;
use crate::query::QueryResult;
use crate::state::{
    CacheState, FetchOutcome, FetchResult, InFlightFetch, RollbackPoint, SharedFetch,
};

/// Client-side cache for the signed-in user's notes.
///
/// Cloning is cheap and every clone shares the same snapshot. Construct one
/// per session owner and call [`reset`](NotesCache::reset) when the session
/// ends.
#[derive(Clone)]
pub struct NotesCache {
    inner: Arc<Inner>,
}

struct Inner {
    repo: NoteRepo,
    bus: Arc<EventBus>,
    state: Mutex<CacheState>,
    mutations: MutationTracker,
    placeholder_seq: AtomicU64,
}

impl NotesCache {
    pub fn new(repo: NoteRepo, bus: Arc<EventBus>) -> Self {
        Self {
            inner: Arc::new(Inner {
                repo,
                bus,
                state: Mutex::new(CacheState::default()),
                mutations: MutationTracker::default(),
                placeholder_seq: AtomicU64::new(0),
            }),
        }
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.inner.bus
    }

    // ---- reads ----

    /// Current snapshot and status. Never blocks on the network.
    pub fn query(&self) -> QueryResult {
        self.inner.lock().query()
    }

    /// Fetch the collection, joining the in-flight fetch if there is one.
    ///
    /// Returns [`NoteError::Cancelled`] when a mutation or a reset
    /// supersedes the fetch before it completes.
    pub async fn refetch(&self) -> Result<Vec<Note>, NoteError> {
        self.inner.join_or_start_fetch().await
    }

    /// Return the snapshot if it is fresh, otherwise fetch.
    pub async fn ensure_fresh(&self) -> Result<Vec<Note>, NoteError> {
        let fresh = self.inner.lock().fresh_snapshot();
        match fresh {
            Some(notes) => Ok(notes),
            None => self.refetch().await,
        }
    }

    /// Look a note up in the snapshot.
    pub fn note(&self, id: &str) -> Option<Note> {
        self.inner.lock().find(id)
    }

    pub async fn signed_url(&self, image_ref: &str) -> Result<String, NoteError> {
        self.inner.repo.signed_url(image_ref).await
    }

    pub fn is_mutating(&self, kind: MutationKind) -> bool {
        self.inner.mutations.count(kind) > 0
    }

    pub fn pending_mutations(&self) -> usize {
        self.inner.mutations.total()
    }

    // ---- mutations ----

    /// Create a note. A placeholder is visible in the snapshot until the
    /// reconciling fetch replaces it.
    pub async fn create_note(&self, draft: NoteDraft) -> Result<Note, NoteError> {
        let draft = draft.normalized();
        validate_draft(&draft)?;

        let inner = &self.inner;
        let guard = inner.mutations.begin(&inner.bus, MutationKind::Create);

        let placeholder = Note::placeholder(inner.next_placeholder_id(), &draft);
        tracing::debug!(placeholder_id = %placeholder.id, "Applying optimistic create");
        let rollback = inner.apply_optimistic(move |notes| notes.insert(0, placeholder));
        let epoch = rollback.epoch();

        let result = inner.repo.create_note(&draft).await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Create failed, rolling back");
            inner.roll_back(rollback);
        }

        inner.reconcile(epoch).await;
        guard.finish(result)
    }

    /// Update the fields present in `patch`. The snapshot changes only when
    /// the reconciling fetch lands.
    pub async fn update_note(&self, id: &str, patch: NotePatch) -> Result<Note, NoteError> {
        let patch = patch.normalized();
        validate_patch(&patch)?;
        if is_placeholder_id(id) {
            return Err(NoteError::NotFound { id: id.to_string() });
        }

        let inner = &self.inner;
        let guard = inner.mutations.begin(&inner.bus, MutationKind::Update);
        let epoch = inner.lock().epoch();

        let result = inner.repo.update_note(id, &patch).await;
        match &result {
            Ok(_) => inner.reconcile(epoch).await,
            Err(e) => tracing::warn!(note_id = %id, error = %e, "Update failed"),
        }
        guard.finish(result)
    }

    /// Delete a note. It disappears from the snapshot immediately and comes
    /// back if the backend refuses.
    pub async fn delete_note(&self, note: &Note) -> Result<(), NoteError> {
        if note.is_placeholder() {
            return Err(NoteError::NotFound {
                id: note.id.clone(),
            });
        }

        let inner = &self.inner;
        let guard = inner.mutations.begin(&inner.bus, MutationKind::Delete);

        let id = note.id.clone();
        let rollback = inner.apply_optimistic(move |notes| notes.retain(|n| n.id != id));
        let epoch = rollback.epoch();

        let result = inner.repo.delete_note(note).await;
        if let Err(e) = &result {
            tracing::warn!(note_id = %note.id, error = %e, "Delete failed, rolling back");
            inner.roll_back(rollback);
        }

        inner.reconcile(epoch).await;
        guard.finish(result)
    }

    // ---- lifecycle ----

    /// Cancel any fetch and drop all cached data.
    pub fn reset(&self) {
        self.inner.lock().clear();
        self.inner.bus.publish(CacheEventKind::Reset);
        tracing::info!("Notes cache reset");
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn next_placeholder_id(&self) -> String {
        let seq = self.placeholder_seq.fetch_add(1, Ordering::Relaxed);
        placeholder_id(Utc::now().timestamp_millis(), seq)
    }

    fn publish_snapshot(&self, revision: u64, len: usize) {
        self.bus
            .publish(CacheEventKind::SnapshotChanged { revision, len });
    }

    // ---- fetching ----

    fn join_or_start_fetch(self: &Arc<Self>) -> SharedFetch {
        let (generation, fetch) = {
            let mut state = self.lock();
            if let Some(fetch) = state.current_fetch() {
                tracing::trace!("Joining in-flight fetch");
                return fetch;
            }
            self.spawn_fetch(&mut state)
        };
        self.bus.publish(CacheEventKind::FetchStarted { generation });
        fetch
    }

    /// Mark the snapshot stale and start a fetch that supersedes any
    /// in-flight one. Does nothing once the cache has left `epoch`.
    fn restart_fetch(self: &Arc<Self>, epoch: u64) -> Option<SharedFetch> {
        let (generation, fetch) = {
            let mut state = self.lock();
            if state.epoch() != epoch {
                return None;
            }
            state.mark_stale();
            state.supersede_fetch();
            self.spawn_fetch(&mut state)
        };
        self.bus.publish(CacheEventKind::FetchStarted { generation });
        Some(fetch)
    }

    /// Spawn a list fetch and register it as the in-flight one.
    fn spawn_fetch(self: &Arc<Self>, state: &mut CacheState) -> (u64, SharedFetch) {
        let generation = state.next_generation();
        let cancel = CancellationToken::new();

        let inner = Arc::clone(self);
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            let result = tokio::select! {
                _ = token.cancelled() => return Err(NoteError::Cancelled),
                result = inner.repo.list_notes() => result,
            };
            inner.complete_fetch(generation, result)
        });

        let fetch = async move {
            task.await
                .unwrap_or_else(|e| Err(NoteError::Fetch(format!("Fetch task failed: {e}"))))
        }
        .boxed()
        .shared();

        state.track_fetch(InFlightFetch {
            generation,
            cancel,
            fetch: fetch.clone(),
        });
        tracing::debug!(generation, "Started notes fetch");
        (generation, fetch)
    }

    fn complete_fetch(&self, generation: u64, result: FetchResult) -> FetchResult {
        let outcome = self.lock().finish_fetch(generation, &result);
        match outcome {
            FetchOutcome::Replaced { revision, len } => {
                tracing::debug!(generation, revision, len, "Snapshot replaced");
                self.publish_snapshot(revision, len);
                result
            }
            FetchOutcome::Failed { message } => {
                tracing::warn!(generation, error = %message, "Notes fetch failed");
                self.bus.publish(CacheEventKind::FetchFailed { message });
                result
            }
            FetchOutcome::Fenced => {
                tracing::debug!(generation, "Discarding superseded fetch result");
                Err(NoteError::Cancelled)
            }
        }
    }

    /// Settle a mutation: refetch and wait for the snapshot to be replaced.
    ///
    /// When another mutation supersedes this fetch, its fetch is awaited
    /// instead. Failures are reported through the query status. Skipped
    /// when the cache was reset since `epoch`.
    async fn reconcile(self: &Arc<Self>, epoch: u64) {
        let Some(mut fetch) = self.restart_fetch(epoch) else {
            tracing::debug!(epoch, "Cache was reset, skipping reconciliation");
            return;
        };
        loop {
            match fetch.await {
                Ok(_) => return,
                Err(NoteError::Cancelled) => {
                    let next = {
                        let state = self.lock();
                        if state.epoch() == epoch {
                            state.current_fetch()
                        } else {
                            None
                        }
                    };
                    match next {
                        Some(next) => fetch = next,
                        None => {
                            tracing::debug!("Reconciliation superseded");
                            return;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Reconciliation failed, keeping last snapshot");
                    return;
                }
            }
        }
    }

    // ---- optimistic patches ----

    fn apply_optimistic(&self, patch: impl FnOnce(&mut Vec<Note>)) -> RollbackPoint {
        let (point, revision, len, superseded) = {
            let mut state = self.lock();
            let superseded = state.supersede_fetch();
            let point = state.apply(patch);
            (point, state.revision(), state.len(), superseded)
        };
        if let Some(generation) = superseded {
            tracing::debug!(generation, "Cancelled in-flight fetch before optimistic update");
        }
        self.publish_snapshot(revision, len);
        point
    }

    fn roll_back(&self, point: RollbackPoint) {
        let epoch = point.epoch();
        let (revision, len) = {
            let mut state = self.lock();
            if !state.rollback(point) {
                drop(state);
                tracing::debug!(epoch, "Cache was reset, dropping rollback");
                return;
            }
            (state.revision(), state.len())
        };
        self.publish_snapshot(revision, len);
    }
}
