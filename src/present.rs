//! Presenting and saving a generated sprite sheet.

use crate::data_url::{decode_base64_lenient, DataUrl};
use crate::error::{Result, SpriteError};
use std::path::{Component, Path, PathBuf};

/// File name the sprite sheet is always saved under.
pub const SPRITE_SHEET_FILENAME: &str = "generated-sprite-sheet.png";

/// File name of the HTML preview written next to the sprite sheet.
pub const PREVIEW_FILENAME: &str = "generated-sprite-sheet.html";

/// Wraps a returned payload as the PNG data URL shown to the user.
///
/// The service's declared MIME type is not consulted.
pub fn result_data_url(payload: &str) -> String {
    DataUrl::new("image/png", payload).to_string()
}

/// Renders an HTML page showing the sprite sheet with nearest-neighbour
/// scaling, plus a download link.
pub fn render_preview_html(data_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Generated Sprite Sheet</title>
<style>
body {{ background: #0f172a; color: #e2e8f0; font-family: sans-serif; display: flex; flex-direction: column; align-items: center; gap: 1rem; padding: 2rem; }}
img {{ width: 100%; max-width: 1024px; object-fit: contain; image-rendering: pixelated; image-rendering: crisp-edges; }}
a {{ color: #c084fc; }}
</style>
</head>
<body>
<img src="{data_url}" alt="Generated Sprite Sheet">
<a href="{data_url}" download="{SPRITE_SHEET_FILENAME}">Download Sprite Sheet</a>
</body>
</html>
"#
    )
}

/// Rejects output directories that climb out with `..`.
fn validate_output_dir(dir: &Path) -> Result<()> {
    if dir.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(SpriteError::InvalidRequest(
            "output path must not contain '..' components".into(),
        ));
    }
    Ok(())
}

/// Decodes a sprite sheet data URL and writes it to
/// `dir/generated-sprite-sheet.png`, returning the written path.
///
/// `dir` is created if missing.
pub fn save_sprite_sheet(data_url: &str, dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = dir.as_ref();
    validate_output_dir(dir)?;

    let bytes = decode_base64_lenient(data_url).map_err(|e| SpriteError::Decode(e.to_string()))?;
    std::fs::create_dir_all(dir)?;
    let path = dir.join(SPRITE_SHEET_FILENAME);
    std::fs::write(&path, &bytes)?;

    tracing::debug!(path = %path.display(), size_bytes = bytes.len(), "saved sprite sheet");
    Ok(path)
}

/// Writes the HTML preview to `dir/generated-sprite-sheet.html`.
pub fn save_preview(data_url: &str, dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = dir.as_ref();
    validate_output_dir(dir)?;

    std::fs::create_dir_all(dir)?;
    let path = dir.join(PREVIEW_FILENAME);
    std::fs::write(&path, render_preview_html(data_url))?;
    Ok(path)
}
