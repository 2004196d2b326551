//! Data access layer.
//!
//! Each repository method turns one logical operation into one or more
//! backend calls and returns a normalized [`Note`](pocketnotes_core::note::Note)
//! or a [`NoteError`](pocketnotes_core::error::NoteError) that keeps the
//! backend's message.

pub mod repositories;

pub use repositories::{AuthRepo, NoteRepo, DEFAULT_SIGNED_URL_TTL_SECS};
