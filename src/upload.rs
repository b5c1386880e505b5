//! Reading a user-selected character image into a data URL.

use crate::data_url::DataUrl;
use crate::error::{Result, SpriteError};
use std::path::{Path, PathBuf};

/// Uploads above this size get a warning; they are never rejected.
pub const MAX_UPLOAD_HINT_BYTES: usize = 4 * 1024 * 1024;

/// Content type declared for files with no recognizable extension.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// A file the user picked, together with the content type it declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Location of the file on disk.
    pub path: PathBuf,
    /// Declared content type, e.g. `image/png`.
    pub content_type: String,
}

impl UploadFile {
    /// Picks a file, declaring its content type from the file name.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let content_type = declared_content_type(&path);
        Self { path, content_type }
    }

    /// Overrides the declared content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Returns true if the declared type is an image type.
    pub fn is_image(&self) -> bool {
        validate_content_type(&self.content_type).is_ok()
    }
}

/// An accepted upload and its encoded form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    /// The file the image was read from.
    pub path: PathBuf,
    /// Content type declared by the file.
    pub content_type: String,
    /// The file contents as `data:<content_type>;base64,...`.
    pub data_url: DataUrl,
}

impl UploadedImage {
    /// Builds an upload from bytes already in memory.
    pub fn from_bytes(
        path: impl Into<PathBuf>,
        content_type: impl Into<String>,
        bytes: &[u8],
    ) -> Self {
        let content_type = content_type.into();
        let data_url = DataUrl::from_bytes(content_type.clone(), bytes);
        Self {
            path: path.into(),
            content_type,
            data_url,
        }
    }
}

/// Returns the content type a file declares, guessed from its extension.
pub fn declared_content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string())
}

/// Accepts only `image/*` content types.
pub fn validate_content_type(content_type: &str) -> Result<()> {
    if content_type.starts_with("image/") {
        Ok(())
    } else {
        Err(SpriteError::InvalidFile {
            content_type: content_type.to_string(),
        })
    }
}

/// Validates and reads a picked file into an [`UploadedImage`].
pub async fn read_upload(file: &UploadFile) -> Result<UploadedImage> {
    validate_content_type(&file.content_type)?;

    let bytes = tokio::fs::read(&file.path)
        .await
        .map_err(|source| SpriteError::ReadFailed {
            path: file.path.display().to_string(),
            source,
        })?;

    if bytes.len() > MAX_UPLOAD_HINT_BYTES {
        tracing::warn!(
            path = %file.path.display(),
            size_bytes = bytes.len(),
            "upload exceeds the recommended 4MB"
        );
    }
    tracing::debug!(
        path = %file.path.display(),
        content_type = %file.content_type,
        size_bytes = bytes.len(),
        "read upload"
    );

    Ok(UploadedImage::from_bytes(
        file.path.clone(),
        file.content_type.clone(),
        &bytes,
    ))
}
