//! Repository for session operations.

use std::sync::Arc;

use pocketnotes_core::error::NoteError;
use pocketnotes_core::session::{Session, SignUpOutcome, User};
use pocketnotes_core::validation::{Credentials, Registration};
use pocketnotes_remote::SessionService;
use tokio::sync::watch;

/// Sign-in, sign-up and sign-out with form validation in front.
#[derive(Clone)]
pub struct AuthRepo {
    auth: Arc<dyn SessionService>,
}

impl AuthRepo {
    pub fn new(auth: Arc<dyn SessionService>) -> Self {
        Self { auth }
    }

    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Session, NoteError> {
        credentials.check()?;
        self.auth
            .sign_in(credentials)
            .await
            .map_err(|e| NoteError::Auth(e.to_string()))
    }

    pub async fn sign_up(&self, registration: &Registration) -> Result<SignUpOutcome, NoteError> {
        registration.check()?;
        self.auth
            .sign_up(&registration.credentials())
            .await
            .map_err(|e| NoteError::Auth(e.to_string()))
    }

    pub async fn sign_out(&self) -> Result<(), NoteError> {
        self.auth
            .sign_out()
            .await
            .map_err(|e| NoteError::Auth(e.to_string()))
    }

    pub async fn current_user(&self) -> Result<Option<User>, NoteError> {
        self.auth
            .current_user()
            .await
            .map_err(|e| NoteError::Auth(e.to_string()))
    }

    /// Session changes, starting with the current session.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.auth.subscribe()
    }
}
