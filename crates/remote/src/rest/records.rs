//! PostgREST access to the `notes` table.

use async_trait::async_trait;
use pocketnotes_core::note::{NewNoteRow, Note};

use super::RestBackend;
use crate::error::RemoteError;
use crate::service::{RecordChanges, RecordStore};

const NOTES_PATH: &str = "/rest/v1/notes";

/// Ask PostgREST to echo the affected rows.
const RETURN_REPRESENTATION: (&str, &str) = ("Prefer", "return=representation");

fn id_filter(id: &str) -> [(&'static str, String); 1] {
    [("id", format!("eq.{id}"))]
}

#[async_trait]
impl RecordStore for RestBackend {
    async fn select_all(&self) -> Result<Vec<Note>, RemoteError> {
        let response = self
            .authorize(self.client.get(self.url(NOTES_PATH)))
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn insert(&self, row: &NewNoteRow) -> Result<Note, RemoteError> {
        let response = self
            .authorize(self.client.post(self.url(NOTES_PATH)))
            .header(RETURN_REPRESENTATION.0, RETURN_REPRESENTATION.1)
            .json(row)
            .send()
            .await?;

        let rows: Vec<Note> = Self::parse_response(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| RemoteError::Decode("insert returned no rows".into()))
    }

    async fn update(
        &self,
        id: &str,
        changes: &RecordChanges,
    ) -> Result<Option<Note>, RemoteError> {
        let response = self
            .authorize(self.client.patch(self.url(NOTES_PATH)))
            .query(&id_filter(id))
            .header(RETURN_REPRESENTATION.0, RETURN_REPRESENTATION.1)
            .json(changes)
            .send()
            .await?;

        let rows: Vec<Note> = Self::parse_response(response).await?;
        Ok(rows.into_iter().next())
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        let response = self
            .authorize(self.client.delete(self.url(NOTES_PATH)))
            .query(&id_filter(id))
            .send()
            .await?;

        Self::check_status(response).await
    }
}
