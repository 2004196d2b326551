//! The `Note` record and its create/update inputs.
//!
//! Field names follow the backend's `notes` table on the wire
//! (`user_id`, `content`, `image_path`) and the domain vocabulary in code
//! (`owner`, `body`, `image_ref`).

use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::naming::{is_placeholder_id, PLACEHOLDER_OWNER};
use crate::types::{NoteId, Timestamp, UserId};
use crate::validation::not_blank;

/// A row from the backend `notes` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    #[serde(rename = "user_id")]
    pub owner: UserId,
    pub title: String,
    #[serde(rename = "content")]
    pub body: String,
    #[serde(
        rename = "image_path",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub image_ref: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Note {
    /// Build an optimistic entry shown before the backend confirms a create.
    pub fn placeholder(id: NoteId, draft: &NoteDraft) -> Self {
        let now = Utc::now();
        Self {
            id,
            owner: PLACEHOLDER_OWNER.to_string(),
            title: draft.title.clone(),
            body: draft.body.clone(),
            image_ref: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// `true` if this entry was created client-side and is not yet confirmed.
    pub fn is_placeholder(&self) -> bool {
        is_placeholder_id(&self.id)
    }
}

/// An image picked for upload alongside a new note.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Input for creating a note.
#[derive(Debug, Clone, Validate)]
pub struct NoteDraft {
    #[validate(custom(function = "not_blank"))]
    pub title: String,
    #[validate(custom(function = "not_blank"))]
    pub body: String,
    pub image: Option<ImageUpload>,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: ImageUpload) -> Self {
        self.image = Some(image);
        self
    }

    /// Trim title and body the way the note form submits them.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.body = self.body.trim().to_string();
        self
    }
}

/// Partial update for a note. Only present fields are changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Validate)]
pub struct NotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "not_blank"))]
    pub title: Option<String>,
    #[serde(rename = "content", skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "not_blank"))]
    pub body: Option<String>,
}

impl NotePatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            body: None,
        }
    }

    pub fn body(body: impl Into<String>) -> Self {
        Self {
            title: None,
            body: Some(body.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none()
    }

    pub fn normalized(self) -> Self {
        Self {
            title: self.title.map(|t| t.trim().to_string()),
            body: self.body.map(|b| b.trim().to_string()),
        }
    }
}

/// Row inserted into `notes` by the create flow.
#[derive(Debug, Clone, Serialize)]
pub struct NewNoteRow {
    pub user_id: UserId,
    pub title: String,
    pub content: String,
}

/// Sort notes newest first, the order every list is presented in.
pub fn sort_newest_first(notes: &mut [Note]) {
    notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Note {
        serde_json::from_value(serde_json::json!({
            "id": "2b0c7a8e-8d7e-4a1f-9d51-0c4b6a9f1d11",
            "user_id": "u-1",
            "title": "Groceries",
            "content": "milk, eggs",
            "created_at": "2024-03-01T10:00:00Z",
            "updated_at": "2024-03-01T10:00:00Z"
        }))
        .expect("valid note json")
    }

    #[test]
    fn note_reads_backend_column_names() {
        let note = sample();
        assert_eq!(note.owner, "u-1");
        assert_eq!(note.body, "milk, eggs");
        assert!(note.image_ref.is_none());
        assert_eq!(note.created_at, note.updated_at);
    }

    #[test]
    fn note_reads_null_image_path() {
        let note: Note = serde_json::from_value(serde_json::json!({
            "id": "n", "user_id": "u", "title": "t", "content": "c",
            "image_path": null,
            "created_at": "2024-03-01T10:00:00Z",
            "updated_at": "2024-03-01T10:00:00Z"
        }))
        .expect("valid note json");
        assert!(note.image_ref.is_none());
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let json = serde_json::to_value(NotePatch::title("Groceries v2")).unwrap();
        assert_eq!(json, serde_json::json!({ "title": "Groceries v2" }));

        let json = serde_json::to_value(NotePatch::body("bread")).unwrap();
        assert_eq!(json, serde_json::json!({ "content": "bread" }));
    }

    #[test]
    fn draft_normalization_trims() {
        let draft = NoteDraft::new("  Title ", "\tbody\n").normalized();
        assert_eq!(draft.title, "Title");
        assert_eq!(draft.body, "body");
    }

    #[test]
    fn placeholder_carries_draft_text() {
        let draft = NoteDraft::new("Groceries", "milk");
        let note = Note::placeholder("optimistic-1-1".into(), &draft);
        assert!(note.is_placeholder());
        assert_eq!(note.title, "Groceries");
        assert_eq!(note.owner, PLACEHOLDER_OWNER);
        assert!(!sample().is_placeholder());
    }

    #[test]
    fn sort_orders_by_creation_descending() {
        let older = sample();
        let mut newer = sample();
        newer.id = "newer".into();
        newer.created_at = older.created_at + chrono::Duration::seconds(5);

        let mut notes = vec![older.clone(), newer.clone()];
        sort_newest_first(&mut notes);
        assert_eq!(notes[0].id, "newer");
        assert_eq!(notes[1].id, older.id);
    }

    #[test]
    fn image_debug_hides_bytes() {
        let image = ImageUpload {
            file_name: "a.jpg".into(),
            content_type: "image/jpeg".into(),
            bytes: vec![1, 2, 3],
        };
        let debug = format!("{image:?}");
        assert!(debug.contains("len: 3"));
    }
}
