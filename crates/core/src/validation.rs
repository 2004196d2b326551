//! Caller-side validation, run before any network call.
//!
//! Note inputs and auth forms derive [`validator::Validate`]; the helpers
//! here turn the collected errors into one human-readable
//! [`NoteError::Validation`] message.

use std::borrow::Cow;

use serde::Serialize;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::NoteError;
use crate::note::{NoteDraft, NotePatch};

/// Message shown when a note is submitted without title or body.
pub const MISSING_NOTE_FIELDS: &str = "Please fill in both title and content";

/// Reject strings that are empty after trimming.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message(Cow::Borrowed("must not be blank")));
    }
    Ok(())
}

/// Validate a (normalized) create input.
pub fn validate_draft(draft: &NoteDraft) -> Result<(), NoteError> {
    draft
        .validate()
        .map_err(|_| NoteError::Validation(MISSING_NOTE_FIELDS.to_string()))
}

/// Validate a (normalized) update input. An empty patch is rejected.
pub fn validate_patch(patch: &NotePatch) -> Result<(), NoteError> {
    if patch.is_empty() {
        return Err(NoteError::Validation("Nothing to update".to_string()));
    }
    patch
        .validate()
        .map_err(|_| NoteError::Validation(MISSING_NOTE_FIELDS.to_string()))
}

/// Sign-in form input.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct Credentials {
    #[validate(custom(function = "not_blank"))]
    pub email: String,
    #[validate(custom(function = "not_blank"))]
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_string(),
            password: password.into(),
        }
    }

    pub fn check(&self) -> Result<(), NoteError> {
        self.validate()
            .map_err(|_| NoteError::Validation("Please fill in all fields".to_string()))
    }
}

/// Sign-up form input.
#[derive(Debug, Clone, Validate)]
pub struct Registration {
    #[validate(
        custom(function = "not_blank"),
        email(message = "Please enter a valid email address")
    )]
    pub email: String,
    #[validate(
        custom(function = "not_blank"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub password: String,
    #[validate(
        custom(function = "not_blank"),
        must_match(other = "password", message = "Passwords do not match")
    )]
    pub confirm_password: String,
}

impl Registration {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into().trim().to_string(),
            password: password.into(),
            confirm_password: confirm_password.into(),
        }
    }

    /// Check the form the way the sign-up screen does: missing fields
    /// first, then the confirmation, then the password length.
    pub fn check(&self) -> Result<(), NoteError> {
        let Err(errors) = self.validate() else {
            return Ok(());
        };
        if has_code(&errors, "blank") {
            return Err(NoteError::Validation("Please fill in all fields".to_string()));
        }
        let message = first_message(&errors, &["confirm_password", "password", "email"])
            .unwrap_or_else(|| "Invalid sign-up details".to_string());
        Err(NoteError::Validation(message))
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.email.clone(), self.password.clone())
    }
}

/// `true` if any field failed with the given validation code.
fn has_code(errors: &ValidationErrors, code: &str) -> bool {
    errors
        .field_errors()
        .values()
        .any(|list| list.iter().any(|e| e.code == code))
}

/// First message found, checking fields in the given priority order.
fn first_message(errors: &ValidationErrors, order: &[&str]) -> Option<String> {
    let fields = errors.field_errors();
    order.iter().find_map(|field| {
        fields
            .get(*field)
            .and_then(|list| list.iter().find_map(|e| e.message.as_ref()))
            .map(|m| m.to_string())
    })
}
