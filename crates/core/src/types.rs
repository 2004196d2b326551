/// Note identifiers are opaque strings issued by the backend (UUIDs), or
/// client-side placeholders for optimistic entries.
pub type NoteId = String;

/// Auth user identifiers are opaque strings issued by the auth service.
pub type UserId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
