//! In-process backend.
//!
//! [`MemoryBackend`] implements the record store, object store and session
//! service in memory with the same observable rules as the hosted backend:
//! rows are scoped to the signed-in user, ids are UUIDs, `created_at` equals
//! `updated_at` on insert and every update strictly increases `updated_at`.
//!
//! Any [`Operation`] can be made to fail with [`MemoryBackend::fail`], and
//! every call is counted, which the test suites rely on.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use pocketnotes_core::note::{sort_newest_first, NewNoteRow, Note};
use pocketnotes_core::session::{Session, SignUpOutcome, User};
use pocketnotes_core::types::Timestamp;
use pocketnotes_core::validation::Credentials;
use tokio::sync::watch;

use crate::error::RemoteError;
use crate::service::{ObjectStore, RecordChanges, RecordStore, SessionService};

/// Backend calls that can be counted and failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    SelectAll,
    Insert,
    Update,
    Delete,
    Upload,
    Remove,
    SignedUrl,
    SignIn,
    SignUp,
    SignOut,
}

/// A stored image object.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Default)]
struct MemoryState {
    notes: Vec<Note>,
    objects: HashMap<String, StoredObject>,
    /// Registered accounts keyed by email.
    accounts: HashMap<String, (User, String)>,
    failures: HashMap<Operation, String>,
    calls: HashMap<Operation, usize>,
    last_timestamp: Option<Timestamp>,
}

/// In-memory stand-in for the Remote Data Service.
pub struct MemoryBackend {
    bucket: String,
    state: Mutex<MemoryState>,
    session: watch::Sender<Option<Session>>,
}

impl MemoryBackend {
    pub fn new(bucket: impl Into<String>) -> Self {
        let (session, _) = watch::channel(None);
        Self {
            bucket: bucket.into(),
            state: Mutex::new(MemoryState::default()),
            session,
        }
    }

    /// Make every subsequent call of `op` fail with `message`.
    pub fn fail(&self, op: Operation, message: impl Into<String>) {
        self.lock().failures.insert(op, message.into());
    }

    /// Stop failing `op`.
    pub fn recover(&self, op: Operation) {
        self.lock().failures.remove(&op);
    }

    /// Number of times `op` has been called, failed calls included.
    pub fn calls(&self, op: Operation) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Every stored row, regardless of owner, newest first.
    pub fn all_notes(&self) -> Vec<Note> {
        self.lock().notes.clone()
    }

    pub fn object(&self, path: &str) -> Option<StoredObject> {
        self.lock().objects.get(path).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.lock().objects.len()
    }

    // ---- private helpers ----

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A poisoned lock only means a test panicked mid-call; the data is
        // still consistent for the next caller.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Count the call and return the injected failure, if any.
    fn enter(&self, op: Operation) -> Result<MutexGuard<'_, MemoryState>, RemoteError> {
        let mut state = self.lock();
        *state.calls.entry(op).or_insert(0) += 1;
        if let Some(message) = state.failures.get(&op) {
            tracing::debug!(?op, %message, "Injected backend failure");
            return Err(RemoteError::Backend(message.clone()));
        }
        Ok(state)
    }

    fn current_user_id(&self) -> Option<String> {
        self.session.borrow().as_ref().map(|s| s.user.id.clone())
    }

    fn require_user(&self) -> Result<String, RemoteError> {
        self.current_user_id().ok_or(RemoteError::NotAuthenticated)
    }

    fn open_session(&self, user: User) -> Session {
        let session = Session {
            access_token: uuid::Uuid::new_v4().to_string(),
            refresh_token: Some(uuid::Uuid::new_v4().to_string()),
            expires_at: Some(Utc::now() + Duration::hours(1)),
            user,
        };
        self.session.send_replace(Some(session.clone()));
        session
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new("note-images")
    }
}

impl MemoryState {
    /// A timestamp strictly after every one handed out before.
    fn next_timestamp(&mut self) -> Timestamp {
        let now = Utc::now();
        let next = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(next);
        next
    }
}

#[async_trait]
impl RecordStore for MemoryBackend {
    async fn select_all(&self) -> Result<Vec<Note>, RemoteError> {
        let user = self.current_user_id();
        let state = self.enter(Operation::SelectAll)?;
        let Some(user) = user else {
            return Ok(Vec::new());
        };
        let mut rows: Vec<Note> = state
            .notes
            .iter()
            .filter(|n| n.owner == user)
            .cloned()
            .collect();
        sort_newest_first(&mut rows);
        Ok(rows)
    }

    async fn insert(&self, row: &NewNoteRow) -> Result<Note, RemoteError> {
        let user = self.current_user_id();
        let mut state = self.enter(Operation::Insert)?;
        if user.as_deref() != Some(row.user_id.as_str()) {
            return Err(RemoteError::Backend(
                "new row violates row-level security policy for table \"notes\"".into(),
            ));
        }

        let now = state.next_timestamp();
        let note = Note {
            id: uuid::Uuid::new_v4().to_string(),
            owner: row.user_id.clone(),
            title: row.title.clone(),
            body: row.content.clone(),
            image_ref: None,
            created_at: now,
            updated_at: now,
        };
        state.notes.insert(0, note.clone());
        Ok(note)
    }

    async fn update(
        &self,
        id: &str,
        changes: &RecordChanges,
    ) -> Result<Option<Note>, RemoteError> {
        let user = self.current_user_id();
        let mut state = self.enter(Operation::Update)?;
        let now = state.next_timestamp();

        let Some(note) = state
            .notes
            .iter_mut()
            .find(|n| n.id == id && Some(&n.owner) == user.as_ref())
        else {
            return Ok(None);
        };

        if let Some(title) = &changes.title {
            note.title = title.clone();
        }
        if let Some(content) = &changes.content {
            note.body = content.clone();
        }
        if let Some(path) = &changes.image_path {
            note.image_ref = Some(path.clone());
        }
        note.updated_at = now;
        Ok(Some(note.clone()))
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        let user = self.current_user_id();
        let mut state = self.enter(Operation::Delete)?;
        state
            .notes
            .retain(|n| !(n.id == id && Some(&n.owner) == user.as_ref()));
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryBackend {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), RemoteError> {
        let user = self.require_user()?;
        let mut state = self.enter(Operation::Upload)?;
        if !path.starts_with(&format!("{user}/")) {
            return Err(RemoteError::Backend(
                "new row violates row-level security policy".into(),
            ));
        }
        if state.objects.contains_key(path) {
            return Err(RemoteError::Backend("The resource already exists".into()));
        }
        state.objects.insert(
            path.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn remove(&self, paths: &[String]) -> Result<(), RemoteError> {
        let mut state = self.enter(Operation::Remove)?;
        for path in paths {
            state.objects.remove(path);
        }
        Ok(())
    }

    async fn signed_url(&self, path: &str, ttl_secs: u64) -> Result<String, RemoteError> {
        let state = self.enter(Operation::SignedUrl)?;
        if !state.objects.contains_key(path) {
            return Err(RemoteError::Backend("Object not found".into()));
        }
        Ok(format!(
            "memory://{}/{}?token={}&expires_in={}",
            self.bucket,
            path,
            uuid::Uuid::new_v4(),
            ttl_secs
        ))
    }
}

#[async_trait]
impl SessionService for MemoryBackend {
    async fn current_user(&self) -> Result<Option<User>, RemoteError> {
        Ok(self.session.borrow().as_ref().map(|s| s.user.clone()))
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, RemoteError> {
        let user = {
            let state = self.enter(Operation::SignIn)?;
            match state.accounts.get(&credentials.email) {
                Some((user, password)) if *password == credentials.password => user.clone(),
                _ => return Err(RemoteError::Backend("Invalid login credentials".into())),
            }
        };
        Ok(self.open_session(user))
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, RemoteError> {
        let user = {
            let mut state = self.enter(Operation::SignUp)?;
            if state.accounts.contains_key(&credentials.email) {
                return Err(RemoteError::Backend("User already registered".into()));
            }
            let user = User {
                id: uuid::Uuid::new_v4().to_string(),
                email: Some(credentials.email.clone()),
            };
            state.accounts.insert(
                credentials.email.clone(),
                (user.clone(), credentials.password.clone()),
            );
            user
        };
        Ok(SignUpOutcome::SignedIn(self.open_session(user)))
    }

    async fn sign_out(&self) -> Result<(), RemoteError> {
        drop(self.enter(Operation::SignOut)?);
        self.session.send_replace(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.session.subscribe()
    }
}
