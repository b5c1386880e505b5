//! Sprite sheet generation on top of an [`ImageProvider`].

use crate::data_url::DataUrl;
use crate::error::{Result, SpriteError};
use crate::image::provider::ImageProvider;
use crate::image::types::{GeneratedImage, GenerationRequest};

/// Instruction sent alongside every character image.
pub const SPRITE_SHEET_PROMPT: &str = "Analyze the single character in the provided image. \
Generate a 4x4 sprite sheet for a walking animation of this character. \
The character should walk towards the right. \
Each frame should show a distinct phase of the walk cycle. \
Ensure the background of the entire sprite sheet is transparent. \
The final output should be a single image file containing all 16 frames arranged in a grid.";

/// Sends character images to a provider and hands back sprite sheets.
#[derive(Debug, Clone)]
pub struct SpriteSheetClient<P> {
    provider: P,
}

impl<P: ImageProvider> SpriteSheetClient<P> {
    /// Wraps a provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Returns the wrapped provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Generates a sprite sheet from an image data URL.
    ///
    /// Returns the base64 payload of the first image the provider produced.
    /// Every failure, including a malformed `data_url`, is logged and then
    /// reported as [`SpriteError::GenerationFailed`].
    pub async fn generate_sprite_sheet(&self, data_url: &str) -> Result<String> {
        self.generate_detailed(data_url)
            .await
            .map(|image| image.data)
            .map_err(|e| {
                tracing::error!(
                    provider = self.provider.name(),
                    error = %e,
                    "sprite sheet generation failed"
                );
                SpriteError::GenerationFailed
            })
    }

    async fn generate_detailed(&self, data_url: &str) -> Result<GeneratedImage> {
        let input_image = DataUrl::parse(data_url)?;
        let request = GenerationRequest::new(SPRITE_SHEET_PROMPT, input_image);
        self.provider.generate(&request).await
    }
}
