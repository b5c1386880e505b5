#![warn(missing_docs)]
//! spritegen - Walk-cycle sprite sheets from a single character image.
//!
//! The crate reads a character image into a base64 data URL, sends it to a
//! Gemini image model with a fixed sprite sheet prompt, and hands back the
//! first image the model returns.
//!
//! # Quick Start
//!
//! ```no_run
//! use spritegen::{App, GeminiProvider, UploadFile};
//!
//! #[tokio::main]
//! async fn main() -> spritegen::Result<()> {
//!     let provider = GeminiProvider::builder().build()?;
//!     let mut app = App::new(provider);
//!
//!     app.upload(&UploadFile::new("hero.png")).await?;
//!     app.generate().await;
//!
//!     match app.state().error() {
//!         Some(message) => eprintln!("{message}"),
//!         None => {
//!             app.save_result(".")?;
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `cli` (default): the `spritegen` command-line binary

mod error;

pub mod app;
pub mod data_url;
pub mod image;
pub mod present;
pub mod upload;

// Re-export error types at crate root
pub use error::{
    Result, SpriteError, GENERATION_FAILED_MESSAGE, INVALID_FILE_MESSAGE, READ_FAILED_MESSAGE,
};

pub use app::{App, AppState, Phase};
pub use data_url::DataUrl;
pub use image::providers::{GeminiModel, GeminiProvider, GeminiProviderBuilder};
pub use image::{
    GeneratedImage, GenerationMetadata, GenerationRequest, ImageProvider, SpriteSheetClient,
    SPRITE_SHEET_PROMPT,
};
pub use present::SPRITE_SHEET_FILENAME;
pub use upload::{UploadFile, UploadedImage};
