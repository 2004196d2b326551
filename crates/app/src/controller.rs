//! Screen logic: turns user intents into cache and auth calls and the
//! results into screen text.

use std::path::PathBuf;

use pocketnotes_cache::NotesCache;
use pocketnotes_core::error::NoteError;
use pocketnotes_core::note::{Note, NoteDraft, NotePatch};
use pocketnotes_core::session::SignUpOutcome;
use pocketnotes_core::types::NoteId;
use pocketnotes_core::validation::{Credentials, Registration};
use pocketnotes_data::AuthRepo;

use crate::command::NoteRef;
use crate::image::load_image;
use crate::screens;

/// Input collected by the create form.
#[derive(Debug, Clone, Default)]
pub struct NoteForm {
    pub title: String,
    pub body: String,
    pub image_path: Option<PathBuf>,
}

/// Input collected by the edit form. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct EditForm {
    pub title: Option<String>,
    pub body: Option<String>,
}

impl EditForm {
    /// The fields that differ from `note`.
    pub fn patch_for(&self, note: &Note) -> NotePatch {
        let changed = |new: &Option<String>, current: &str| {
            new.as_ref()
                .map(|v| v.trim().to_string())
                .filter(|v| v != current)
        };
        NotePatch {
            title: changed(&self.title, &note.title),
            body: changed(&self.body, &note.body),
        }
    }
}

pub struct App {
    auth: AuthRepo,
    cache: NotesCache,
    /// Ids in the order of the last rendered list, for `#n` references.
    listed: Vec<NoteId>,
}

impl App {
    pub fn new(auth: AuthRepo, cache: NotesCache) -> Self {
        Self {
            auth,
            cache,
            listed: Vec::new(),
        }
    }

    pub fn cache(&self) -> &NotesCache {
        &self.cache
    }

    pub fn is_signed_in(&self) -> bool {
        self.auth.subscribe().borrow().is_some()
    }

    // ---- auth screens ----

    pub async fn sign_up(&mut self, registration: Registration) -> String {
        match self.auth.sign_up(&registration).await {
            Ok(SignUpOutcome::SignedIn(session)) => {
                tracing::info!(user_id = %session.user.id, "Signed up");
                self.forget_notes();
                let email = session.user.email.unwrap_or(registration.email);
                format!("Welcome, {email}!\n\n{}", self.list().await)
            }
            Ok(SignUpOutcome::ConfirmationRequired(_)) => screens::SIGN_UP_CONFIRM.to_string(),
            Err(e) => auth_failure(e),
        }
    }

    pub async fn log_in(&mut self, credentials: Credentials) -> String {
        match self.auth.sign_in(&credentials).await {
            Ok(session) => {
                tracing::info!(user_id = %session.user.id, "Signed in");
                self.forget_notes();
                let who = session.user.email.unwrap_or(credentials.email);
                format!("Signed in as {who}.\n\n{}", self.list().await)
            }
            Err(e) => auth_failure(e),
        }
    }

    pub async fn log_out(&mut self) -> String {
        self.forget_notes();
        match self.auth.sign_out().await {
            Ok(()) => "Signed out.".to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "Sign-out failed");
                format!("Error: {e}")
            }
        }
    }

    /// Drop everything cached for the previous session before the next
    /// screen renders.
    fn forget_notes(&mut self) {
        self.listed.clear();
        self.cache.reset();
    }

    // ---- notes list ----

    /// Show the list, fetching only if the snapshot is missing or stale.
    pub async fn list(&mut self) -> String {
        if let Err(e) = self.cache.ensure_fresh().await {
            tracing::debug!(error = %e, "List fetch failed");
        }
        self.render_list()
    }

    /// Show the list after a forced refetch.
    pub async fn refresh(&mut self) -> String {
        if let Err(e) = self.cache.refetch().await {
            tracing::debug!(error = %e, "Refresh failed");
        }
        self.render_list()
    }

    fn render_list(&mut self) -> String {
        let query = self.cache.query();
        self.listed = query.notes().iter().map(|n| n.id.clone()).collect();
        screens::notes_list(&query)
    }

    // ---- details ----

    /// Resolve a reference against the snapshot, loading it first if needed.
    pub async fn find(&self, target: &NoteRef) -> Option<Note> {
        if self.cache.query().data.is_none() {
            let _ = self.cache.ensure_fresh().await;
        }
        let id = match target {
            NoteRef::Id(id) => id.as_str(),
            NoteRef::Index(n) => self.listed.get(n - 1)?.as_str(),
        };
        self.cache.note(id)
    }

    pub async fn show(&mut self, target: &NoteRef) -> String {
        let Some(note) = self.find(target).await else {
            return screens::NOTE_NOT_FOUND.to_string();
        };

        let signed = match note.image_ref.as_deref() {
            Some(image_ref) => Some(self.cache.signed_url(image_ref).await),
            None => None,
        };
        let image = signed.as_ref().map(|r| match r {
            Ok(url) => Ok(url.as_str()),
            Err(_) => Err("could not load image"),
        });
        if let Some(Err(e)) = &signed {
            tracing::warn!(note_id = %note.id, error = %e, "Signed URL failed");
        }
        screens::note_details(&note, image)
    }

    // ---- form ----

    pub async fn create(&mut self, form: NoteForm) -> String {
        let mut draft = NoteDraft::new(form.title, form.body);
        if let Some(path) = &form.image_path {
            match load_image(path).await {
                Ok(image) => draft = draft.with_image(image),
                Err(e) => return format!("Could not attach image: {e}"),
            }
        }

        match self.cache.create_note(draft).await {
            Ok(note) => format!("Note saved: {}", note.title),
            Err(e) => mutation_failure(e, screens::SAVE_FAILED),
        }
    }

    pub async fn edit(&mut self, note: &Note, form: EditForm) -> String {
        let patch = form.patch_for(note);
        if patch.is_empty() {
            return "No changes.".to_string();
        }
        match self.cache.update_note(&note.id, patch).await {
            Ok(updated) => format!("Note updated: {}", updated.title),
            Err(e) => mutation_failure(e, screens::SAVE_FAILED),
        }
    }

    pub async fn delete(&mut self, target: &NoteRef) -> String {
        let Some(note) = self.find(target).await else {
            return screens::NOTE_NOT_FOUND.to_string();
        };
        match self.cache.delete_note(&note).await {
            Ok(()) => {
                self.listed.retain(|id| id != &note.id);
                format!("Deleted: {}", note.title)
            }
            Err(e) => mutation_failure(e, screens::DELETE_FAILED),
        }
    }
}

/// Validation messages are shown as-is; anything else gets the generic
/// acknowledgment.
fn mutation_failure(error: NoteError, acknowledgment: &str) -> String {
    match error {
        NoteError::Validation(message) => message,
        NoteError::NotFound { .. } => screens::NOTE_NOT_FOUND.to_string(),
        other => {
            tracing::warn!(error = %other, "Mutation failed");
            acknowledgment.to_string()
        }
    }
}

fn auth_failure(error: NoteError) -> String {
    match error {
        NoteError::Validation(message) | NoteError::Auth(message) => format!("Error: {message}"),
        other => {
            tracing::warn!(error = %other, "Unexpected auth failure");
            "Error: An unexpected error occurred".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn note() -> Note {
        let now = Utc::now();
        Note {
            id: "n1".into(),
            owner: "u1".into(),
            title: "Groceries".into(),
            body: "milk".into(),
            image_ref: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn edit_form_keeps_unchanged_fields_out_of_the_patch() {
        let form = EditForm {
            title: Some(" Groceries ".into()),
            body: Some("milk, eggs".into()),
        };
        assert_eq!(form.patch_for(&note()), NotePatch::body("milk, eggs"));
        assert!(EditForm::default().patch_for(&note()).is_empty());
    }

    #[test]
    fn blank_edit_is_sent_for_validation() {
        let form = EditForm {
            title: Some("   ".into()),
            body: None,
        };
        assert_eq!(form.patch_for(&note()), NotePatch::title(""));
    }

    #[test]
    fn failures_map_to_acknowledgments() {
        assert_eq!(
            mutation_failure(NoteError::Create("boom".into()), screens::SAVE_FAILED),
            screens::SAVE_FAILED
        );
        assert_eq!(
            mutation_failure(
                NoteError::Validation("Please fill in both title and content".into()),
                screens::SAVE_FAILED
            ),
            "Please fill in both title and content"
        );
        assert_eq!(
            auth_failure(NoteError::Auth("Invalid login credentials".into())),
            "Error: Invalid login credentials"
        );
    }
}
