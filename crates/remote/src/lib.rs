//! Remote Data Service boundary.
//!
//! The backend is consumed through three traits: [`RecordStore`] for the
//! `notes` table, [`ObjectStore`] for image objects and [`SessionService`]
//! for auth. Two implementations are provided:
//!
//! - [`rest::RestBackend`] talks to a Supabase-compatible REST backend
//!   (PostgREST, Storage and GoTrue endpoints) through [`reqwest`].
//! - [`memory::MemoryBackend`] keeps everything in process; it backs the
//!   offline demo mode and the test suites, and supports failure injection.

pub mod error;
pub mod memory;
pub mod rest;
pub mod service;

pub use error::RemoteError;
pub use service::{ObjectStore, RecordChanges, RecordStore, RemoteService, SessionService};
