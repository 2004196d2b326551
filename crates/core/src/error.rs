use crate::types::NoteId;

/// Errors surfaced by the data access layer and the notes cache.
///
/// Backend messages are carried verbatim in the string payloads. The type
/// is `Clone` because one fetch result may be handed to several waiters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NoteError {
    #[error("User not authenticated: {0}")]
    Auth(String),

    #[error("Note not found: {id}")]
    NotFound { id: NoteId },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// A read failed: listing notes or signing an image URL.
    #[error("{0}")]
    Fetch(String),

    #[error("Failed to create note: {0}")]
    Create(String),

    #[error("Failed to update note: {0}")]
    Update(String),

    #[error("Failed to upload image: {0}")]
    Upload(String),

    #[error("Failed to delete note: {0}")]
    Delete(String),

    /// A fetch was superseded by a mutation or a reset before it finished.
    #[error("Request cancelled")]
    Cancelled,
}

impl NoteError {
    /// `true` for errors raised before any network call was made.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
