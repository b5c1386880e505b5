//! Sprite sheet example - turns a character image into a walk cycle.
//!
//! Run with: `cargo run --example sprite_sheet -- <character.png> [output_dir]`
//!
//! Requires `API_KEY` (or `GOOGLE_API_KEY`) environment variable.

use spritegen::{App, GeminiProvider, UploadFile};

#[tokio::main]
async fn main() -> spritegen::Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(input_path) = args.next() else {
        eprintln!("Usage: sprite_sheet <character.png> [output_dir]");
        std::process::exit(2);
    };
    let output_dir = args.next().unwrap_or_else(|| ".".to_string());

    let provider = GeminiProvider::builder().build()?;
    let mut app = App::new(provider);

    if let Err(e) = app.upload(&UploadFile::new(&input_path)).await {
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }

    app.generate().await;

    if let Some(message) = app.state().error() {
        eprintln!("{message}");
        std::process::exit(1);
    }

    if let Some(path) = app.save_result(&output_dir)? {
        println!("Sprite sheet saved to {}", path.display());
    }

    Ok(())
}
