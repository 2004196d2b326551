//! Text rendering of the app's screens.
//!
//! Every function here is pure: it turns cache state or a note into the
//! text shown for it.

use std::fmt::Write;

use pocketnotes_cache::{QueryResult, QueryStatus};
use pocketnotes_core::naming::slugify_title;
use pocketnotes_core::note::Note;
use pocketnotes_core::types::Timestamp;

pub const SAVE_FAILED: &str = "Failed to save note. Please try again.";
pub const DELETE_FAILED: &str = "Failed to delete note. Please try again.";
pub const LOAD_FAILED: &str = "Failed to load notes. Please check your connection and try again.";
pub const EMPTY_NOTES: &str =
    "You haven't created any notes yet. Start by creating your first note!";
pub const NOTE_NOT_FOUND: &str = "Note not found. It may have been deleted.";
pub const SIGN_UP_CONFIRM: &str =
    "Account created successfully! Please check your email to verify your account.";
pub const LOGIN_REQUIRED: &str = "Please log in first. Type `help` for commands.";

const PREVIEW_CHARS: usize = 60;

/// The notes list, numbered so `#n` can address an entry.
pub fn notes_list(query: &QueryResult) -> String {
    match (&query.data, query.status) {
        (None, QueryStatus::Loading) => "Loading notes...".to_string(),
        (None, QueryStatus::Error) | (None, QueryStatus::Success) => error_view(LOAD_FAILED),
        (Some(notes), _) if notes.is_empty() && query.status != QueryStatus::Error => {
            format!("{EMPTY_NOTES}\nType `new` to create a note.")
        }
        (Some(notes), status) => {
            let mut out = String::from("My Notes\n");
            for (i, note) in notes.iter().enumerate() {
                out.push_str(&list_entry(i + 1, note));
            }
            if status == QueryStatus::Error {
                let _ = write!(out, "\n(showing saved copy) {LOAD_FAILED}");
            } else if query.is_fetching {
                out.push_str("\nRefreshing...");
            }
            out.trim_end().to_string()
        }
    }
}

fn list_entry(position: usize, note: &Note) -> String {
    let mut out = format!("{position:>3}. {}", note.title);
    if note.image_ref.is_some() {
        out.push_str(" [image]");
    }
    if note.is_placeholder() {
        out.push_str(" (saving...)");
    } else {
        let _ = write!(out, "  {}", date(&note.created_at));
    }
    let _ = write!(out, "\n     {}\n", preview(&note.body));
    out
}

/// One note with its dates and, if it has one, the image link.
pub fn note_details(note: &Note, image: Option<Result<&str, &str>>) -> String {
    let mut out = format!("{}\n{}\n\n{}\n\n", note.title, "=".repeat(note.title.chars().count()), note.body);

    match image {
        Some(Ok(url)) => {
            let _ = writeln!(out, "Image: {url}");
        }
        Some(Err(reason)) => {
            let _ = writeln!(out, "Image unavailable: {reason}");
        }
        None => {}
    }

    let _ = writeln!(out, "Created: {}", date_time(&note.created_at));
    if note.updated_at != note.created_at {
        let _ = writeln!(out, "Updated: {}", date_time(&note.updated_at));
    }
    let _ = write!(out, "Id: {} ({})", note.id, slugify_title(&note.title));
    out
}

/// A failed query, with the retry hint.
pub fn error_view(message: &str) -> String {
    format!("{message}\nType `refresh` to retry.")
}

/// `YYYY-MM-DD`.
pub fn date(at: &Timestamp) -> String {
    at.format("%Y-%m-%d").to_string()
}

fn date_time(at: &Timestamp) -> String {
    at.format("%B %-d, %Y %H:%M").to_string()
}

fn preview(body: &str) -> String {
    let line = body.lines().next().unwrap_or_default();
    let mut preview: String = line.chars().take(PREVIEW_CHARS).collect();
    if line.chars().count() > PREVIEW_CHARS || body.lines().nth(1).is_some() {
        preview.push_str("...");
    }
    preview
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn note(id: &str, title: &str) -> Note {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        Note {
            id: id.to_string(),
            owner: "u1".to_string(),
            title: title.to_string(),
            body: "milk, eggs".to_string(),
            image_ref: None,
            created_at: at,
            updated_at: at,
        }
    }

    fn query(data: Option<Vec<Note>>, status: QueryStatus) -> QueryResult {
        QueryResult {
            data,
            status,
            error_message: None,
            is_fetching: false,
            is_stale: false,
            revision: 0,
        }
    }

    #[test]
    fn loading_and_empty_states() {
        assert_eq!(
            notes_list(&query(None, QueryStatus::Loading)),
            "Loading notes..."
        );
        assert!(notes_list(&query(Some(vec![]), QueryStatus::Success)).starts_with(EMPTY_NOTES));
    }

    #[test]
    fn error_without_data_offers_retry() {
        let text = notes_list(&query(None, QueryStatus::Error));
        assert!(text.starts_with(LOAD_FAILED));
        assert!(text.contains("refresh"));
    }

    #[test]
    fn list_is_numbered_with_dates_and_markers() {
        let mut with_image = note("n2", "Cat");
        with_image.image_ref = Some("u1/n2-1.jpg".into());
        let text = notes_list(&query(
            Some(vec![with_image, note("n1", "Groceries")]),
            QueryStatus::Success,
        ));

        assert!(text.contains("  1. Cat [image]  2024-03-09"));
        assert!(text.contains("  2. Groceries  2024-03-09"));
        assert!(text.contains("milk, eggs"));
    }

    #[test]
    fn placeholders_show_as_saving() {
        let mut pending = note("optimistic-1-0", "Draft");
        pending.owner = "pending-owner".into();
        let text = notes_list(&query(Some(vec![pending]), QueryStatus::Success));
        assert!(text.contains("Draft (saving...)"));
    }

    #[test]
    fn stale_list_after_error_keeps_notes() {
        let text = notes_list(&query(Some(vec![note("n1", "Groceries")]), QueryStatus::Error));
        assert!(text.contains("Groceries"));
        assert!(text.contains(LOAD_FAILED));
    }

    #[test]
    fn details_show_updated_only_when_changed() {
        let mut n = note("n1", "Groceries List");
        let text = note_details(&n, None);
        assert!(text.contains("Created: March 9, 2024 14:05"));
        assert!(!text.contains("Updated:"));
        assert!(text.ends_with("Id: n1 (groceries-list)"));

        n.updated_at = Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap();
        let text = note_details(&n, Some(Ok("https://cdn/x.jpg")));
        assert!(text.contains("Updated: March 10, 2024 08:00"));
        assert!(text.contains("Image: https://cdn/x.jpg"));
    }

    #[test]
    fn long_bodies_are_shortened_in_previews() {
        assert_eq!(preview("short"), "short");
        assert_eq!(preview("first\nsecond"), "first...");
        assert_eq!(preview(&"x".repeat(70)).chars().count(), PREVIEW_CHARS + 3);
    }
}
