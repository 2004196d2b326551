//! Repository for the `notes` collection and its images.

use chrono::Utc;
use pocketnotes_core::error::NoteError;
use pocketnotes_core::naming::image_object_path;
use pocketnotes_core::note::{sort_newest_first, NewNoteRow, Note, NoteDraft, NotePatch};
use pocketnotes_core::session::User;
use pocketnotes_remote::{RecordChanges, RemoteService};

/// Lifetime of signed image URLs (10 minutes).
pub const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 600;

/// Notes CRUD plus image upload, removal and signing.
#[derive(Clone)]
pub struct NoteRepo {
    remote: RemoteService,
    signed_url_ttl_secs: u64,
}

impl NoteRepo {
    pub fn new(remote: RemoteService) -> Self {
        Self {
            remote,
            signed_url_ttl_secs: DEFAULT_SIGNED_URL_TTL_SECS,
        }
    }

    pub fn with_signed_url_ttl(mut self, ttl_secs: u64) -> Self {
        self.signed_url_ttl_secs = ttl_secs;
        self
    }

    /// All notes of the signed-in user, newest first.
    pub async fn list_notes(&self) -> Result<Vec<Note>, NoteError> {
        let mut notes = self
            .remote
            .records
            .select_all()
            .await
            .map_err(|e| NoteError::Fetch(format!("Failed to fetch notes: {e}")))?;
        sort_newest_first(&mut notes);
        tracing::debug!(count = notes.len(), "Fetched notes");
        Ok(notes)
    }

    /// Create a note, then attach its image if one was supplied.
    ///
    /// The two steps are not atomic: when the upload fails the text note
    /// stays committed and [`NoteError::Upload`] is returned.
    pub async fn create_note(&self, draft: &NoteDraft) -> Result<Note, NoteError> {
        let user = self.require_user().await?;

        let row = NewNoteRow {
            user_id: user.id.clone(),
            title: draft.title.clone(),
            content: draft.body.clone(),
        };
        let note = self
            .remote
            .records
            .insert(&row)
            .await
            .map_err(|e| NoteError::Create(e.to_string()))?;
        tracing::info!(note_id = %note.id, "Note created");

        let Some(image) = &draft.image else {
            return Ok(note);
        };

        let path = image_object_path(
            &user.id,
            &note.id,
            Utc::now().timestamp_millis(),
            &image.file_name,
            &image.content_type,
        );

        if let Err(e) = self
            .remote
            .objects
            .upload(&path, image.bytes.clone(), &image.content_type)
            .await
        {
            tracing::warn!(
                note_id = %note.id,
                path = %path,
                error = %e,
                "Image upload failed, note kept without image",
            );
            return Err(NoteError::Upload(e.to_string()));
        }

        let updated = self
            .remote
            .records
            .update(&note.id, &RecordChanges::image_path(path.clone()))
            .await
            .map_err(|e| NoteError::Update(format!("attaching image {path}: {e}")))?
            .ok_or_else(|| NoteError::NotFound {
                id: note.id.clone(),
            })?;

        tracing::info!(note_id = %updated.id, path = %path, "Image attached to note");
        Ok(updated)
    }

    /// Change only the fields present in `patch`.
    pub async fn update_note(&self, id: &str, patch: &NotePatch) -> Result<Note, NoteError> {
        let updated = self
            .remote
            .records
            .update(id, &RecordChanges::from(patch))
            .await
            .map_err(|e| NoteError::Update(e.to_string()))?
            .ok_or_else(|| NoteError::NotFound { id: id.to_string() })?;

        tracing::info!(note_id = %id, "Note updated");
        Ok(updated)
    }

    /// Delete a note and, best effort, its image.
    ///
    /// A failed image removal is logged and ignored; only a failed record
    /// deletion is an error.
    pub async fn delete_note(&self, note: &Note) -> Result<(), NoteError> {
        if let Some(path) = note.image_ref.as_deref().filter(|p| !p.is_empty()) {
            if let Err(e) = self.remote.objects.remove(&[path.to_string()]).await {
                tracing::warn!(
                    note_id = %note.id,
                    path = %path,
                    error = %e,
                    "Failed to delete image from storage",
                );
            }
        }

        self.remote
            .records
            .delete(&note.id)
            .await
            .map_err(|e| NoteError::Delete(e.to_string()))?;

        tracing::info!(note_id = %note.id, "Note deleted");
        Ok(())
    }

    /// A time-limited URL for a stored image.
    pub async fn signed_url(&self, image_ref: &str) -> Result<String, NoteError> {
        self.remote
            .objects
            .signed_url(image_ref, self.signed_url_ttl_secs)
            .await
            .map_err(|e| NoteError::Fetch(format!("Failed to get signed URL: {e}")))
    }

    // ---- private helpers ----

    async fn require_user(&self) -> Result<User, NoteError> {
        self.remote
            .auth
            .current_user()
            .await
            .map_err(|e| NoteError::Auth(e.to_string()))?
            .ok_or_else(|| NoteError::Auth("no active session".to_string()))
    }
}
