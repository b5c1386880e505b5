//! `data:<mime>;base64,<payload>` strings.

use crate::error::{Result, SpriteError};
use base64::Engine;
use std::fmt;

/// An image encoded as a base64 data URL.
///
/// The payload is kept as the base64 text it arrived in; nothing here decodes
/// or checks it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    mime_type: String,
    data: String,
}

impl DataUrl {
    /// Creates a data URL from a MIME type and an already-encoded payload.
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Encodes raw bytes under the given MIME type.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(
            mime_type,
            base64::engine::general_purpose::STANDARD.encode(bytes),
        )
    }

    /// Splits an image data URL into its MIME type and payload.
    ///
    /// Accepts `data:image/<subtype>;base64,<payload>` where the subtype is
    /// made of ASCII letters, digits or `_`, and the payload sits on one line.
    pub fn parse(s: &str) -> Result<Self> {
        let rest = s.strip_prefix("data:").ok_or(SpriteError::InvalidDataUrl)?;
        let (mime_type, data) = rest
            .split_once(";base64,")
            .ok_or(SpriteError::InvalidDataUrl)?;

        let subtype = mime_type
            .strip_prefix("image/")
            .ok_or(SpriteError::InvalidDataUrl)?;
        if subtype.is_empty()
            || !subtype
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(SpriteError::InvalidDataUrl);
        }
        if data.contains(['\n', '\r']) {
            return Err(SpriteError::InvalidDataUrl);
        }

        Ok(Self::new(mime_type, data))
    }

    /// Returns the declared MIME type, e.g. `image/png`.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Returns the base64 payload.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Consumes the URL, returning `(mime_type, data)`.
    pub fn into_parts(self) -> (String, String) {
        (self.mime_type, self.data)
    }
}

impl fmt::Display for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Decodes a base64 payload that may be imperfectly formatted.
///
/// Tolerates a leading data URL prefix, embedded whitespace and missing
/// `=` padding.
pub(crate) fn decode_base64_lenient(input: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    let b64 = match input.find(";base64,") {
        Some(pos) => &input[pos + 8..],
        None => input,
    };

    let cleaned: String = b64.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    if let Ok(data) = base64::engine::general_purpose::STANDARD.decode(&cleaned) {
        return Ok(data);
    }

    base64::engine::general_purpose::STANDARD_NO_PAD.decode(&cleaned)
}
