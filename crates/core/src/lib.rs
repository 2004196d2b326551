//! Domain types shared by every PocketNotes crate.
//!
//! Holds the `Note` record and its create/update inputs, the auth
//! session types, the [`error::NoteError`] taxonomy, field validation,
//! and naming helpers for stored images and optimistic placeholders.

pub mod error;
pub mod naming;
pub mod note;
pub mod session;
pub mod types;
pub mod validation;
