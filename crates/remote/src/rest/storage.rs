//! Storage API access for note images.

use async_trait::async_trait;
use serde::Deserialize;

use super::RestBackend;
use crate::error::RemoteError;
use crate::service::ObjectStore;

/// Response of `POST /storage/v1/object/sign/{bucket}/{path}`.
#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

impl RestBackend {
    fn object_url(&self, path: &str) -> String {
        self.url(&format!(
            "/storage/v1/object/{}/{}",
            self.bucket,
            path.trim_start_matches('/')
        ))
    }

    /// Signed paths come back relative to `/storage/v1`.
    fn absolute_signed_url(&self, signed: &str) -> String {
        if signed.starts_with("http://") || signed.starts_with("https://") {
            signed.to_string()
        } else {
            self.url(&format!("/storage/v1{signed}"))
        }
    }
}

#[async_trait]
impl ObjectStore for RestBackend {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), RemoteError> {
        let response = self
            .authorize(self.client.post(self.object_url(path)))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        Self::check_status(response).await
    }

    async fn remove(&self, paths: &[String]) -> Result<(), RemoteError> {
        let body = serde_json::json!({ "prefixes": paths });

        let response = self
            .authorize(
                self.client
                    .delete(self.url(&format!("/storage/v1/object/{}", self.bucket))),
            )
            .json(&body)
            .send()
            .await?;

        Self::check_status(response).await
    }

    async fn signed_url(&self, path: &str, ttl_secs: u64) -> Result<String, RemoteError> {
        let body = serde_json::json!({ "expiresIn": ttl_secs });

        let response = self
            .authorize(self.client.post(self.url(&format!(
                "/storage/v1/object/sign/{}/{}",
                self.bucket,
                path.trim_start_matches('/')
            ))))
            .json(&body)
            .send()
            .await?;

        let signed: SignedUrlResponse = Self::parse_response(response).await?;
        Ok(self.absolute_signed_url(&signed.signed_url))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::rest::RestConfig;

    fn backend() -> RestBackend {
        RestBackend::with_client(
            reqwest::Client::new(),
            RestConfig {
                base_url: "https://proj.supabase.co".into(),
                anon_key: "anon".into(),
                bucket: "note-images".into(),
                request_timeout: Duration::from_secs(5),
            },
        )
    }

    #[test]
    fn object_url_joins_bucket_and_path() {
        assert_eq!(
            backend().object_url("u1/n1-42.jpg"),
            "https://proj.supabase.co/storage/v1/object/note-images/u1/n1-42.jpg"
        );
    }

    #[test]
    fn relative_signed_url_is_made_absolute() {
        assert_eq!(
            backend().absolute_signed_url("/object/sign/note-images/u1/a.jpg?token=t"),
            "https://proj.supabase.co/storage/v1/object/sign/note-images/u1/a.jpg?token=t"
        );
        assert_eq!(
            backend().absolute_signed_url("https://cdn.example.com/a.jpg?token=t"),
            "https://cdn.example.com/a.jpg?token=t"
        );
    }

    #[test]
    fn signed_url_response_shape() {
        let parsed: SignedUrlResponse =
            serde_json::from_str(r#"{"signedURL":"/object/sign/b/p?token=x"}"#).unwrap();
        assert_eq!(parsed.signed_url, "/object/sign/b/p?token=x");
    }
}
