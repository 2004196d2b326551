//! Naming conventions for stored images, optimistic placeholders and
//! display slugs.

use std::sync::LazyLock;

use regex::Regex;

/// Prefix of every client-generated placeholder id. Backend ids are UUIDs
/// and never start with it.
pub const PLACEHOLDER_PREFIX: &str = "optimistic-";

/// Owner recorded on placeholder entries until the backend assigns one.
pub const PLACEHOLDER_OWNER: &str = "pending-owner";

/// Extension used when neither the file name nor the content type give one.
const FALLBACK_EXTENSION: &str = "bin";

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static SLUG_STRIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\-_]").expect("valid slug regex"));

/// Build a placeholder id: `optimistic-{unix_millis}-{seq}`.
///
/// `seq` disambiguates placeholders created within the same millisecond.
pub fn placeholder_id(unix_millis: i64, seq: u64) -> String {
    format!("{PLACEHOLDER_PREFIX}{unix_millis}-{seq}")
}

/// `true` for ids produced by [`placeholder_id`].
pub fn is_placeholder_id(id: &str) -> bool {
    id.starts_with(PLACEHOLDER_PREFIX)
}

/// Object-store path for a note image.
///
/// Convention: `{owner}/{note_id}-{unix_millis}.{ext}`
///
/// ```
/// use pocketnotes_core::naming::image_object_path;
///
/// assert_eq!(
///     image_object_path("u1", "n1", 1700000000000, "cat.png", "image/png"),
///     "u1/n1-1700000000000.png"
/// );
/// ```
pub fn image_object_path(
    owner: &str,
    note_id: &str,
    unix_millis: i64,
    file_name: &str,
    content_type: &str,
) -> String {
    let ext = image_extension(file_name, content_type);
    format!("{owner}/{note_id}-{unix_millis}.{ext}")
}

/// Extension after the last `.` of the file name, else the content-type
/// subtype (`image/jpeg` -> `jpeg`), else `bin`.
pub fn image_extension(file_name: &str, content_type: &str) -> String {
    if let Some((stem, ext)) = file_name.rsplit_once('.') {
        if !stem.is_empty() && !ext.is_empty() {
            return ext.to_lowercase();
        }
    }
    match content_type.split_once('/') {
        Some((_, subtype)) if !subtype.trim().is_empty() => subtype.trim().to_lowercase(),
        _ => FALLBACK_EXTENSION.to_string(),
    }
}

/// Content type for a picked image file, from its extension.
pub fn content_type_for(file_name: &str) -> Option<&'static str> {
    let (_, ext) = file_name.rsplit_once('.')?;
    match ext.to_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}

/// URL-friendly handle for a note title.
///
/// Trims, lowercases, turns whitespace runs into `-` and drops every
/// character outside `[a-z0-9-_]`.
pub fn slugify_title(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    let dashed = WHITESPACE_RE.replace_all(&lowered, "-");
    SLUG_STRIP_RE.replace_all(&dashed, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_ids_are_recognised() {
        let id = placeholder_id(1_700_000_000_000, 3);
        assert_eq!(id, "optimistic-1700000000000-3");
        assert!(is_placeholder_id(&id));
        assert!(!is_placeholder_id("2b0c7a8e-8d7e-4a1f-9d51-0c4b6a9f1d11"));
    }

    #[test]
    fn image_path_uses_file_extension() {
        assert_eq!(
            image_object_path("u1", "n1", 42, "photo.JPG", "image/jpeg"),
            "u1/n1-42.jpg"
        );
    }

    #[test]
    fn image_path_falls_back_to_content_type() {
        assert_eq!(image_extension("photo", "image/webp"), "webp");
        assert_eq!(image_extension(".hidden", "image/png"), "png");
        assert_eq!(image_extension("photo", "garbage"), "bin");
    }

    #[test]
    fn content_type_from_extension() {
        assert_eq!(content_type_for("a.jpeg"), Some("image/jpeg"));
        assert_eq!(content_type_for("a.PNG"), Some("image/png"));
        assert_eq!(content_type_for("a.txt"), None);
        assert_eq!(content_type_for("noext"), None);
    }

    #[test]
    fn slug_lowercases_and_dashes() {
        assert_eq!(slugify_title("HELLO WORLD"), "hello-world");
        assert_eq!(slugify_title("hello   world"), "hello-world");
        assert_eq!(slugify_title("hello  world  test"), "hello-world-test");
    }

    #[test]
    fn slug_strips_special_characters() {
        assert_eq!(slugify_title("hello@world!"), "helloworld");
        assert_eq!(slugify_title("hello-world_test"), "hello-world_test");
        assert_eq!(slugify_title("hello!!!world???"), "helloworld");
        assert_eq!(slugify_title("!@#$%^&*()"), "");
    }

    #[test]
    fn slug_trims_and_keeps_digits() {
        assert_eq!(slugify_title("  hello world  "), "hello-world");
        assert_eq!(slugify_title("test 123"), "test-123");
        assert_eq!(slugify_title(""), "");
        assert_eq!(
            slugify_title("Hello World! This is a Test."),
            "hello-world-this-is-a-test"
        );
    }
}
