//! Error types for sprite sheet generation.

use std::time::Duration;

/// Shown when an upload does not declare an image content type.
pub const INVALID_FILE_MESSAGE: &str = "Please upload a valid image file (PNG, JPG, etc.).";

/// Shown when an accepted upload cannot be read.
pub const READ_FAILED_MESSAGE: &str = "Failed to read the image file.";

/// Shown for every failed generation attempt.
pub const GENERATION_FAILED_MESSAGE: &str =
    "Failed to generate sprite sheet. Please check the console for details.";

/// Errors that can occur while uploading, generating or saving a sprite sheet.
#[derive(Debug, thiserror::Error)]
pub enum SpriteError {
    /// The selected file does not declare an image content type.
    #[error("not an image file: {content_type}")]
    InvalidFile { content_type: String },

    /// The selected file could not be read.
    #[error("failed to read {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// String is not a `data:image/<type>;base64,<payload>` URL.
    #[error("Invalid base64 image string")]
    InvalidDataUrl,

    /// API key missing or invalid.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The response carried no inline image part.
    #[error("No image was generated in the API response.")]
    NoImageProduced,

    /// Generation failed; the cause has already been logged.
    #[error("{}", GENERATION_FAILED_MESSAGE)]
    GenerationFailed,

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., saving file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SpriteError {
    /// Returns the message shown to the user for this error.
    ///
    /// Upload problems get their own notice; anything that goes wrong around
    /// the model call collapses into one generic message.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidFile { .. } => INVALID_FILE_MESSAGE.to_string(),
            Self::ReadFailed { .. } => READ_FAILED_MESSAGE.to_string(),
            Self::InvalidDataUrl
            | Self::Auth(_)
            | Self::Api { .. }
            | Self::RateLimited { .. }
            | Self::ContentBlocked(_)
            | Self::InvalidRequest(_)
            | Self::NoImageProduced
            | Self::GenerationFailed
            | Self::Network(_)
            | Self::Json(_) => GENERATION_FAILED_MESSAGE.to_string(),
            Self::Decode(_) | Self::Io(_) => self.to_string(),
        }
    }
}

/// Result type alias for sprite sheet operations.
pub type Result<T> = std::result::Result<T, SpriteError>;

/// Reads the `Retry-After` header as whole seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Maximum length of an upstream error body kept in an error message.
const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Trims an upstream error body for logging.
///
/// Bodies are collapsed onto one line and cut at a char boundary.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.len() <= MAX_ERROR_MESSAGE_LEN {
        return single_line;
    }
    let mut end = MAX_ERROR_MESSAGE_LEN;
    while !single_line.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &single_line[..end])
}
