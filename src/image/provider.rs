//! Image provider trait.

use crate::error::Result;
use crate::image::types::{GeneratedImage, GenerationRequest};
use async_trait::async_trait;

/// Trait for services that turn an input image and a prompt into a new image.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Sends one generation request and returns the first image produced.
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage>;

    /// Returns the name of this provider for display.
    fn name(&self) -> &str;

    /// Checks if the provider is reachable and authenticated.
    async fn health_check(&self) -> Result<()>;
}
