//! Application state: the current upload, result, error and in-flight flag.

use crate::error::{Result, SpriteError};
use crate::image::{ImageProvider, SpriteSheetClient};
use crate::present;
use crate::upload::{read_upload, UploadFile, UploadedImage};
use std::path::{Path, PathBuf};

/// Shown when generation is triggered before anything was uploaded.
pub const NO_UPLOAD_MESSAGE: &str = "Please upload an image first.";

/// Where the application is in its upload/generate cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing uploaded yet.
    Idle,
    /// An image is uploaded; no result or error is showing.
    Ready,
    /// A generation request is outstanding.
    Generating,
    /// The last generation succeeded.
    ReadyWithResult,
    /// The last operation failed.
    ReadyWithError,
}

/// Transient state of one session.
///
/// Held in memory only. A result and an error never show at the same time.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    uploaded: Option<UploadedImage>,
    result: Option<String>,
    error: Option<String>,
    generating: bool,
}

impl AppState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current phase.
    pub fn phase(&self) -> Phase {
        if self.generating {
            Phase::Generating
        } else if self.error.is_some() {
            Phase::ReadyWithError
        } else if self.result.is_some() {
            Phase::ReadyWithResult
        } else if self.uploaded.is_some() {
            Phase::Ready
        } else {
            Phase::Idle
        }
    }

    /// The current upload, if any.
    pub fn uploaded(&self) -> Option<&UploadedImage> {
        self.uploaded.as_ref()
    }

    /// The current sprite sheet data URL, if any.
    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    /// The current error message, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns true while a request is outstanding.
    pub fn is_generating(&self) -> bool {
        self.generating
    }

    /// Returns true when the generate action should be enabled.
    pub fn can_generate(&self) -> bool {
        self.uploaded.is_some() && !self.generating
    }

    /// Returns the notice for a rejected file. The state is left untouched.
    pub fn reject_upload(&self, err: &SpriteError) -> String {
        err.user_message()
    }

    /// Replaces the upload and clears any previous result and error.
    pub fn accept_upload(&mut self, image: UploadedImage) {
        self.uploaded = Some(image);
        self.result = None;
        self.error = None;
    }

    /// Records that an accepted file could not be read.
    ///
    /// Any earlier result is dropped along with it.
    pub fn upload_failed(&mut self, err: &SpriteError) {
        self.result = None;
        self.error = Some(err.user_message());
    }

    /// Starts a generation, returning the data URL to submit.
    ///
    /// Returns `None` when nothing is uploaded (an error is recorded) or
    /// when a request is already outstanding.
    pub fn begin_generation(&mut self) -> Option<String> {
        if self.generating {
            return None;
        }
        let Some(uploaded) = &self.uploaded else {
            self.error = Some(NO_UPLOAD_MESSAGE.to_string());
            return None;
        };
        let data_url = uploaded.data_url.to_string();
        self.generating = true;
        self.error = None;
        self.result = None;
        Some(data_url)
    }

    /// Records the outcome of the outstanding request.
    pub fn finish_generation(&mut self, outcome: Result<String>) {
        self.generating = false;
        match outcome {
            Ok(payload) => {
                self.result = Some(present::result_data_url(&payload));
                self.error = None;
            }
            Err(e) => {
                self.result = None;
                self.error = Some(e.user_message());
            }
        }
    }
}

/// The whole application: state plus the client used to generate.
pub struct App<P> {
    state: AppState,
    client: SpriteSheetClient<P>,
}

impl<P: ImageProvider> App<P> {
    /// Creates an idle application backed by `provider`.
    pub fn new(provider: P) -> Self {
        Self {
            state: AppState::new(),
            client: SpriteSheetClient::new(provider),
        }
    }

    /// Read-only view of the state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Returns the generation client.
    pub fn client(&self) -> &SpriteSheetClient<P> {
        &self.client
    }

    /// Uploads a file.
    ///
    /// Non-image files are rejected without touching the state; the error's
    /// [`SpriteError::user_message`] is the notice to show.
    pub async fn upload(&mut self, file: &UploadFile) -> Result<()> {
        match read_upload(file).await {
            Ok(image) => {
                self.state.accept_upload(image);
                Ok(())
            }
            Err(e @ SpriteError::InvalidFile { .. }) => {
                tracing::debug!(content_type = %file.content_type, "rejected upload");
                Err(e)
            }
            Err(e) => {
                self.state.upload_failed(&e);
                Err(e)
            }
        }
    }

    /// Generates a sprite sheet for the current upload.
    ///
    /// Does nothing but record an error when no image is uploaded. The
    /// outcome lands in [`AppState::result`] or [`AppState::error`].
    pub async fn generate(&mut self) {
        let Some(data_url) = self.state.begin_generation() else {
            return;
        };
        let outcome = self.client.generate_sprite_sheet(&data_url).await;
        self.state.finish_generation(outcome);
    }

    /// Saves the current result into `dir`, if there is one.
    pub fn save_result(&self, dir: impl AsRef<Path>) -> Result<Option<PathBuf>> {
        self.state
            .result()
            .map(|url| present::save_sprite_sheet(url, dir))
            .transpose()
    }

    /// HTML preview of the current result, if there is one.
    pub fn preview_html(&self) -> Option<String> {
        self.state.result().map(present::render_preview_html)
    }
}
