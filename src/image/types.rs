//! Core types for image generation.

use crate::data_url::DataUrl;

/// Metadata about the generation process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationMetadata {
    /// Model used for generation.
    pub model: Option<String>,
    /// Generation duration in milliseconds.
    pub duration_ms: Option<u64>,
}

/// A request to transform an input image with a text prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Instruction describing the desired output image.
    pub prompt: String,
    /// Image the instruction applies to.
    pub input_image: DataUrl,
}

impl GenerationRequest {
    /// Creates a new request for the given prompt and input image.
    pub fn new(prompt: impl Into<String>, input_image: DataUrl) -> Self {
        Self {
            prompt: prompt.into(),
            input_image,
        }
    }
}

/// The first image a provider returned.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "generated image should be presented or saved"]
pub struct GeneratedImage {
    /// Base64 payload exactly as the service sent it.
    pub data: String,
    /// MIME type the service declared for the payload.
    pub mime_type: String,
    /// Generation metadata.
    pub metadata: GenerationMetadata,
}

impl GeneratedImage {
    /// Creates a new generated image.
    pub fn new(
        data: impl Into<String>,
        mime_type: impl Into<String>,
        metadata: GenerationMetadata,
    ) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
            metadata,
        }
    }

    /// Returns the decoded size of the payload in bytes.
    pub fn size(&self) -> usize {
        self.data.trim_end_matches('=').len() * 3 / 4
    }
}
