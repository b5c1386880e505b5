//! Image generation module.

mod client;
mod provider;
pub mod providers;
mod types;

pub use client::{SpriteSheetClient, SPRITE_SHEET_PROMPT};
pub use provider::ImageProvider;
pub use types::{GeneratedImage, GenerationMetadata, GenerationRequest};
