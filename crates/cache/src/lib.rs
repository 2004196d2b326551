//! Client cache and mutation coordinator for the notes collection.
//!
//! [`NotesCache`] owns one snapshot of the signed-in user's notes, serves
//! it through [`QueryResult`], coalesces list fetches and applies creates
//! and deletes optimistically with rollback and reconciliation.

mod mutation;
pub mod query;
mod state;
pub mod store;

pub use pocketnotes_events::MutationKind;
pub use query::{QueryResult, QueryStatus};
pub use store::NotesCache;
