/// Errors from the Remote Data Service layer.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("{message} (status {status})")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body, or the raw body.
        message: String,
    },

    /// A success response had an unexpected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// The call needs an authenticated session and there is none.
    #[error("No active session")]
    NotAuthenticated,

    /// A backend-side refusal reported without an HTTP status
    /// (in-process backend).
    #[error("{0}")]
    Backend(String),
}

impl RemoteError {
    /// HTTP status of an API error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Request(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
