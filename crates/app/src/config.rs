use std::time::Duration;

use pocketnotes_data::DEFAULT_SIGNED_URL_TTL_SECS;
use pocketnotes_remote::rest::RestConfig;

const DEFAULT_BUCKET: &str = "note-images";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Errors from reading the environment.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be set when {because}")]
    Missing {
        var: &'static str,
        because: &'static str,
    },

    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Where notes are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    /// Hosted backend over REST.
    Rest { base_url: String, anon_key: String },
    /// In-process backend; data lives until the process exits.
    Memory,
}

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub backend: BackendConfig,
    /// Storage bucket for note images (default: `note-images`).
    pub bucket: String,
    /// Lifetime of signed image URLs in seconds (default: `600`).
    pub signed_url_ttl_secs: u64,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                            | Default                      |
    /// |------------------------------------|------------------------------|
    /// | `POCKETNOTES_BACKEND_URL`          | unset: in-memory backend     |
    /// | `POCKETNOTES_ANON_KEY`             | required with a backend URL  |
    /// | `POCKETNOTES_BUCKET`               | `note-images`                |
    /// | `POCKETNOTES_SIGNED_URL_TTL_SECS`  | `600`                        |
    /// | `POCKETNOTES_REQUEST_TIMEOUT_SECS` | `30`                         |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let backend = match get("POCKETNOTES_BACKEND_URL") {
            Some(base_url) => {
                if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                    return Err(ConfigError::Invalid {
                        var: "POCKETNOTES_BACKEND_URL",
                        expected: "an http(s) URL",
                        value: base_url,
                    });
                }
                let anon_key = get("POCKETNOTES_ANON_KEY").ok_or(ConfigError::Missing {
                    var: "POCKETNOTES_ANON_KEY",
                    because: "POCKETNOTES_BACKEND_URL is set",
                })?;
                BackendConfig::Rest {
                    base_url: base_url.trim_end_matches('/').to_string(),
                    anon_key,
                }
            }
            None => BackendConfig::Memory,
        };

        let bucket = get("POCKETNOTES_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.into());

        let signed_url_ttl_secs = parse_secs(
            "POCKETNOTES_SIGNED_URL_TTL_SECS",
            get("POCKETNOTES_SIGNED_URL_TTL_SECS"),
            DEFAULT_SIGNED_URL_TTL_SECS,
        )?;
        let request_timeout_secs = parse_secs(
            "POCKETNOTES_REQUEST_TIMEOUT_SECS",
            get("POCKETNOTES_REQUEST_TIMEOUT_SECS"),
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;

        Ok(Self {
            backend,
            bucket,
            signed_url_ttl_secs,
            request_timeout_secs,
        })
    }

    /// REST client settings, or `None` for the in-memory backend.
    pub fn rest(&self) -> Option<RestConfig> {
        match &self.backend {
            BackendConfig::Rest { base_url, anon_key } => Some(RestConfig {
                base_url: base_url.clone(),
                anon_key: anon_key.clone(),
                bucket: self.bucket.clone(),
                request_timeout: Duration::from_secs(self.request_timeout_secs),
            }),
            BackendConfig::Memory => None,
        }
    }
}

fn parse_secs(var: &'static str, value: Option<String>, default: u64) -> Result<u64, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::Invalid {
            var,
            expected: "a positive number of seconds",
            value,
        }),
    }
}
