//! Backend traits and the [`RemoteService`] bundle handed to the data
//! access layer.

use std::sync::Arc;

use async_trait::async_trait;
use pocketnotes_core::note::{NewNoteRow, Note, NotePatch};
use pocketnotes_core::session::{Session, SignUpOutcome, User};
use pocketnotes_core::validation::Credentials;
use serde::Serialize;
use tokio::sync::watch;

use crate::error::RemoteError;

/// Column changes sent with an update-by-id. Absent fields are untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

impl RecordChanges {
    /// Attach an uploaded image to a record.
    pub fn image_path(path: impl Into<String>) -> Self {
        Self {
            image_path: Some(path.into()),
            ..Self::default()
        }
    }
}

impl From<&NotePatch> for RecordChanges {
    fn from(patch: &NotePatch) -> Self {
        Self {
            title: patch.title.clone(),
            content: patch.body.clone(),
            image_path: None,
        }
    }
}

/// CRUD over the `notes` table.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All visible rows, newest first.
    async fn select_all(&self) -> Result<Vec<Note>, RemoteError>;

    /// Insert a row and return it as stored.
    async fn insert(&self, row: &NewNoteRow) -> Result<Note, RemoteError>;

    /// Update a row by id. `Ok(None)` when no row matched.
    async fn update(&self, id: &str, changes: &RecordChanges)
        -> Result<Option<Note>, RemoteError>;

    /// Delete a row by id. Deleting a missing row is not an error.
    async fn delete(&self, id: &str) -> Result<(), RemoteError>;
}

/// User-scoped object storage for note images.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), RemoteError>;

    async fn remove(&self, paths: &[String]) -> Result<(), RemoteError>;

    /// A time-limited retrieval URL for an existing object.
    async fn signed_url(&self, path: &str, ttl_secs: u64) -> Result<String, RemoteError>;
}

/// Session-based auth.
#[async_trait]
pub trait SessionService: Send + Sync {
    /// The signed-in user, or `None` without a session.
    async fn current_user(&self) -> Result<Option<User>, RemoteError>;

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, RemoteError>;

    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, RemoteError>;

    async fn sign_out(&self) -> Result<(), RemoteError>;

    /// Session changes, starting with the current session.
    fn subscribe(&self) -> watch::Receiver<Option<Session>>;
}

/// The three backend facets, shareable across tasks.
#[derive(Clone)]
pub struct RemoteService {
    pub records: Arc<dyn RecordStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub auth: Arc<dyn SessionService>,
}

impl RemoteService {
    /// Use one backend value for all three facets.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: RecordStore + ObjectStore + SessionService + 'static,
    {
        Self {
            records: backend.clone(),
            objects: backend.clone(),
            auth: backend,
        }
    }
}
