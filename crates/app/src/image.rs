//! Loading picked image files for upload.

use std::path::Path;

use pocketnotes_core::naming::content_type_for;
use pocketnotes_core::note::ImageUpload;

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("{path}: unsupported image type (use jpg, png, gif, webp or heic)")]
    Unsupported { path: String },

    #[error("{path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Read an image file, deriving its content type from the extension.
pub async fn load_image(path: &Path) -> Result<ImageUpload, ImageError> {
    let display = path.display().to_string();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let content_type = content_type_for(&file_name)
        .ok_or_else(|| ImageError::Unsupported { path: display.clone() })?;

    let bytes = tokio::fs::read(path).await.map_err(|source| ImageError::Read {
        path: display,
        source,
    })?;
    tracing::debug!(file_name = %file_name, len = bytes.len(), "Loaded image");

    Ok(ImageUpload {
        file_name,
        content_type: content_type.to_string(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[tokio::test]
    async fn reads_file_and_infers_type() {
        let path = std::env::temp_dir().join(format!("pocketnotes-{}-cat.PNG", std::process::id()));
        tokio::fs::write(&path, [0x89, b'P', b'N', b'G']).await.unwrap();

        let image = load_image(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        assert_eq!(image.content_type, "image/png");
        assert!(image.file_name.ends_with("cat.PNG"));
        assert_eq!(image.bytes.len(), 4);
    }

    #[tokio::test]
    async fn rejects_unknown_extensions_before_reading() {
        let err = load_image(Path::new("/nonexistent/notes.txt")).await.unwrap_err();
        assert_matches!(err, ImageError::Unsupported { .. });
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let err = load_image(Path::new("/nonexistent/cat.jpg")).await.unwrap_err();
        assert_matches!(err, ImageError::Read { .. });
    }
}
