//! GoTrue password auth.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use pocketnotes_core::session::{Session, SignUpOutcome, User};
use pocketnotes_core::validation::Credentials;
use serde::Deserialize;
use tokio::sync::watch;

use super::RestBackend;
use crate::error::RemoteError;
use crate::service::SessionService;

/// Token grant returned by `/auth/v1/token` and by an auto-confirmed
/// `/auth/v1/signup`.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    user: User,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        Session {
            expires_at: self
                .expires_in
                .map(|secs| Utc::now() + Duration::seconds(secs)),
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            user: self.user,
        }
    }
}

/// `/auth/v1/signup` answers with a token grant when email confirmation
/// is off, and with the bare user when it is on.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(User),
}

#[async_trait]
impl SessionService for RestBackend {
    async fn current_user(&self) -> Result<Option<User>, RemoteError> {
        if self.access_token().is_none() {
            return Ok(None);
        }

        let response = self
            .authorize(self.client.get(self.url("/auth/v1/user")))
            .send()
            .await?;

        match Self::parse_response::<User>(response).await {
            Ok(user) => Ok(Some(user)),
            Err(RemoteError::Api { status: 401, .. }) => {
                tracing::info!("Stored session rejected by the auth service, clearing it");
                self.set_session(None);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, RemoteError> {
        let response = self
            .authorize(self.client.post(self.url("/auth/v1/token")))
            .query(&[("grant_type", "password")])
            .json(credentials)
            .send()
            .await?;

        let session = Self::parse_response::<TokenResponse>(response)
            .await?
            .into_session();

        tracing::info!(user_id = %session.user.id, "Signed in");
        self.set_session(Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, RemoteError> {
        let response = self
            .authorize(self.client.post(self.url("/auth/v1/signup")))
            .json(credentials)
            .send()
            .await?;

        match Self::parse_response::<SignUpResponse>(response).await? {
            SignUpResponse::Session(grant) => {
                let session = grant.into_session();
                tracing::info!(user_id = %session.user.id, "Signed up and signed in");
                self.set_session(Some(session.clone()));
                Ok(SignUpOutcome::SignedIn(session))
            }
            SignUpResponse::User(user) => {
                tracing::info!(user_id = %user.id, "Signed up, email confirmation pending");
                Ok(SignUpOutcome::ConfirmationRequired(user))
            }
        }
    }

    async fn sign_out(&self) -> Result<(), RemoteError> {
        if self.access_token().is_none() {
            return Ok(());
        }

        let response = self
            .authorize(self.client.post(self.url("/auth/v1/logout")))
            .send()
            .await;

        // The local session ends regardless of what the server says.
        self.set_session(None);
        Self::check_status(response?).await
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.session.subscribe()
    }
}
