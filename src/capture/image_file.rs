//! Filesystem image decoder
//!
//! Reads an uploaded image from disk and turns it into a `data:` URI the
//! renderer can display directly.

use super::{ImageDecoder, ImageFile, ImageRef, ReadError, ReadErrorKind};
use async_trait::async_trait;
use tokio::fs;

/// Default upload limit (5MB)
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Leading bytes for each accepted format
const SIGNATURES: &[(&str, &[u8])] = &[
    ("image/png", b"\x89PNG\r\n\x1a\n"),
    ("image/jpeg", b"\xff\xd8\xff"),
    ("image/gif", b"GIF8"),
    ("image/webp", b"RIFF"),
];

pub struct FsImageDecoder {
    max_bytes: u64,
}

impl FsImageDecoder {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    fn media_type(file: &ImageFile) -> Option<&'static str> {
        let guessed = mime_guess::from_path(&file.path).first()?;
        SIGNATURES
            .iter()
            .map(|(media_type, _)| *media_type)
            .find(|media_type| *media_type == guessed.essence_str())
    }

    fn signature_matches(media_type: &str, data: &[u8]) -> bool {
        SIGNATURES
            .iter()
            .find(|(t, _)| *t == media_type)
            .is_some_and(|(_, magic)| data.starts_with(magic))
    }
}

impl Default for FsImageDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IMAGE_BYTES)
    }
}

#[async_trait]
impl ImageDecoder for FsImageDecoder {
    async fn decode(&self, file: &ImageFile) -> Result<ImageRef, ReadError> {
        let fail = |kind, message: String| ReadError::new(file.name.clone(), kind, message);

        let Some(media_type) = Self::media_type(file) else {
            return Err(fail(
                ReadErrorKind::Unsupported,
                "Unsupported image format. Supported: png, jpg, gif, webp".to_string(),
            ));
        };

        let metadata = fs::metadata(&file.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                fail(ReadErrorKind::NotFound, format!("File not found: {}", file.path.display()))
            } else {
                fail(ReadErrorKind::Io, format!("Cannot read file: {e}"))
            }
        })?;

        if !metadata.is_file() {
            return Err(fail(
                ReadErrorKind::Io,
                format!("Not a file: {}", file.path.display()),
            ));
        }

        if metadata.len() > self.max_bytes {
            return Err(fail(
                ReadErrorKind::TooLarge,
                format!(
                    "Image too large: {} bytes (max {} bytes)",
                    metadata.len(),
                    self.max_bytes
                ),
            ));
        }

        let data = fs::read(&file.path)
            .await
            .map_err(|e| fail(ReadErrorKind::Io, format!("Failed to read file: {e}")))?;

        if !Self::signature_matches(media_type, &data) {
            return Err(fail(
                ReadErrorKind::Corrupt,
                format!("File content is not a valid {media_type} image"),
            ));
        }

        tracing::debug!(file = %file.name, media_type, bytes = data.len(), "Image decoded");
        Ok(ImageRef::data_uri(media_type, &data))
    }
}
