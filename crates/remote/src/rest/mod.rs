//! REST client for a Supabase-compatible backend.
//!
//! One [`RestBackend`] implements all three backend traits:
//!
//! - `records` — PostgREST under `/rest/v1/notes`
//! - `storage` — Storage API under `/storage/v1/object`
//! - `auth`    — GoTrue under `/auth/v1`
//!
//! Every request carries the project's anon key in the `apikey` header and
//! a bearer token: the session's access token when signed in, otherwise
//! the anon key.

mod auth;
mod records;
mod storage;

use std::time::Duration;

use pocketnotes_core::session::Session;
use reqwest::RequestBuilder;
use tokio::sync::watch;

use crate::error::RemoteError;

/// Connection settings for a REST backend.
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`.
    pub base_url: String,
    /// Public anon key.
    pub anon_key: String,
    /// Storage bucket holding note images.
    pub bucket: String,
    /// Transport timeout applied to every request.
    pub request_timeout: Duration,
}

/// HTTP client for one backend project.
pub struct RestBackend {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    bucket: String,
    session: watch::Sender<Option<Session>>,
}

impl RestBackend {
    /// Build a backend client with its own connection pool.
    pub fn new(config: RestConfig) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Build a backend client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: RestConfig) -> Self {
        let (session, _) = watch::channel(None);
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key,
            bucket: config.bucket,
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn access_token(&self) -> Option<String> {
        self.session
            .borrow()
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    /// Attach the `apikey` header and the bearer token.
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.access_token().unwrap_or_else(|| self.anon_key.clone());
        request.header("apikey", &self.anon_key).bearer_auth(token)
    }

    fn set_session(&self, session: Option<Session>) {
        self.session.send_replace(session);
    }

    /// Ensure the response has a success status code. Returns the response
    /// unchanged on success, or a [`RemoteError::Api`] carrying the
    /// backend's message on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(RemoteError::Api {
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RemoteError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), RemoteError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

/// Pull a human-readable message out of a backend error body.
///
/// PostgREST uses `message`, GoTrue uses `msg` / `error_description`, and
/// Storage uses `message` or `error`. Falls back to the raw body.
pub(crate) fn extract_error_message(body: &str) -> String {
    const KEYS: &[&str] = &["message", "msg", "error_description", "error"];

    if let Ok(serde_json::Value::Object(obj)) = serde_json::from_str::<serde_json::Value>(body) {
        for key in KEYS {
            if let Some(serde_json::Value::String(msg)) = obj.get(*key) {
                if !msg.trim().is_empty() {
                    return msg.clone();
                }
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "empty response body".to_string()
    } else {
        trimmed.to_string()
    }
}
