use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pocketnotes_cache::NotesCache;
use pocketnotes_core::note::{NewNoteRow, Note, NoteDraft};
use pocketnotes_core::session::{Session, SignUpOutcome, User};
use pocketnotes_core::validation::Credentials;
use pocketnotes_data::NoteRepo;
use pocketnotes_events::EventBus;
use pocketnotes_remote::memory::{MemoryBackend, Operation};
use pocketnotes_remote::{
    ObjectStore, RecordChanges, RecordStore, RemoteError, RemoteService, SessionService,
};
use tokio::sync::{watch, Semaphore};

/// Wraps [`MemoryBackend`] so a test can hold chosen calls at the network
/// boundary and release them later.
pub struct GatedBackend {
    pub memory: Arc<MemoryBackend>,
    gates: Mutex<HashMap<Operation, Arc<Semaphore>>>,
    entered: Mutex<HashMap<Operation, usize>>,
}

impl GatedBackend {
    pub fn new() -> Self {
        Self {
            memory: Arc::new(MemoryBackend::default()),
            gates: Mutex::new(HashMap::new()),
            entered: Mutex::new(HashMap::new()),
        }
    }

    /// Block every subsequent call of `op` until [`release`](Self::release).
    pub fn hold(&self, op: Operation) {
        self.gates
            .lock()
            .unwrap()
            .insert(op, Arc::new(Semaphore::new(0)));
    }

    /// Let held and future calls of `op` through.
    pub fn release(&self, op: Operation) {
        if let Some(gate) = self.gates.lock().unwrap().remove(&op) {
            gate.close();
        }
    }

    /// Calls of `op` that reached the gate, held ones included.
    pub fn entered(&self, op: Operation) -> usize {
        self.entered.lock().unwrap().get(&op).copied().unwrap_or(0)
    }

    /// Yield until `op` has been entered `n` times.
    pub async fn wait_entered(&self, op: Operation, n: usize) {
        for _ in 0..10_000 {
            if self.entered(op) >= n {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("{op:?} was not called {n} times");
    }

    async fn pass(&self, op: Operation) {
        *self.entered.lock().unwrap().entry(op).or_insert(0) += 1;
        let gate = self.gates.lock().unwrap().get(&op).cloned();
        if let Some(gate) = gate {
            // Closing the semaphore is the release signal.
            let _ = gate.acquire().await;
        }
    }
}

#[async_trait]
impl RecordStore for GatedBackend {
    async fn select_all(&self) -> Result<Vec<Note>, RemoteError> {
        self.pass(Operation::SelectAll).await;
        self.memory.select_all().await
    }

    async fn insert(&self, row: &NewNoteRow) -> Result<Note, RemoteError> {
        self.pass(Operation::Insert).await;
        self.memory.insert(row).await
    }

    async fn update(
        &self,
        id: &str,
        changes: &RecordChanges,
    ) -> Result<Option<Note>, RemoteError> {
        self.pass(Operation::Update).await;
        self.memory.update(id, changes).await
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        self.pass(Operation::Delete).await;
        self.memory.delete(id).await
    }
}

#[async_trait]
impl ObjectStore for GatedBackend {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), RemoteError> {
        self.pass(Operation::Upload).await;
        self.memory.upload(path, bytes, content_type).await
    }

    async fn remove(&self, paths: &[String]) -> Result<(), RemoteError> {
        self.pass(Operation::Remove).await;
        self.memory.remove(paths).await
    }

    async fn signed_url(&self, path: &str, ttl_secs: u64) -> Result<String, RemoteError> {
        self.pass(Operation::SignedUrl).await;
        self.memory.signed_url(path, ttl_secs).await
    }
}

#[async_trait]
impl SessionService for GatedBackend {
    async fn current_user(&self) -> Result<Option<User>, RemoteError> {
        self.memory.current_user().await
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, RemoteError> {
        self.memory.sign_in(credentials).await
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, RemoteError> {
        self.memory.sign_up(credentials).await
    }

    async fn sign_out(&self) -> Result<(), RemoteError> {
        self.memory.sign_out().await
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.memory.subscribe()
    }
}

pub struct Harness {
    pub backend: Arc<GatedBackend>,
    pub repo: NoteRepo,
    pub cache: NotesCache,
    pub bus: Arc<EventBus>,
}

impl Harness {
    pub fn memory(&self) -> &MemoryBackend {
        &self.backend.memory
    }

    /// Create notes directly through the data access layer, bypassing the
    /// cache.
    pub async fn seed(&self, titles: &[&str]) -> Vec<Note> {
        let mut notes = Vec::new();
        for title in titles {
            let note = self
                .repo
                .create_note(&NoteDraft::new(*title, format!("{title} body")))
                .await
                .expect("seed note");
            notes.push(note);
        }
        notes
    }
}

/// A signed-in user with an empty cache.
pub async fn harness() -> Harness {
    let backend = Arc::new(GatedBackend::new());
    backend
        .sign_up(&Credentials::new("cache@example.com", "secret1"))
        .await
        .expect("sign up");

    let repo = NoteRepo::new(RemoteService::from_backend(backend.clone()));
    let bus = Arc::new(EventBus::default());
    let cache = NotesCache::new(repo.clone(), bus.clone());
    Harness {
        backend,
        repo,
        cache,
        bus,
    }
}

pub fn ids(notes: &[Note]) -> Vec<String> {
    notes.iter().map(|n| n.id.clone()).collect()
}

pub fn sorted_ids(notes: &[Note]) -> Vec<String> {
    let mut ids = ids(notes);
    ids.sort();
    ids
}
