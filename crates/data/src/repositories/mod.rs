mod auth_repo;
mod note_repo;

pub use auth_repo::AuthRepo;
pub use note_repo::{NoteRepo, DEFAULT_SIGNED_URL_TTL_SECS};
