//! CLI for spritegen - walk-cycle sprite sheets via Gemini.

use clap::{Args, Parser, Subcommand, ValueEnum};
use spritegen::{App, GeminiModel, GeminiProvider, ImageProvider, UploadFile, SPRITE_SHEET_PROMPT};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spritegen")]
#[command(about = "Turn a character image into a 4x4 walk-cycle sprite sheet")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a sprite sheet from a character image
    Generate(GenerateArgs),

    /// Print the prompt sent with every image
    Prompt,

    /// Check that the API key and model are accepted
    Check(ServiceArgs),
}

#[derive(Args)]
struct GenerateArgs {
    /// Character image (PNG, JPG, WEBP)
    input: PathBuf,

    /// Directory to write generated-sprite-sheet.png into
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Declared content type, overriding the one guessed from the extension
    #[arg(long)]
    content_type: Option<String>,

    /// Also write an HTML preview next to the sprite sheet
    #[arg(long)]
    preview: bool,

    #[command(flatten)]
    service: ServiceArgs,
}

#[derive(Args)]
struct ServiceArgs {
    /// Gemini model to use
    #[arg(short, long, value_enum, default_value = "nano-banana")]
    model: ModelArg,

    /// Override the API base URL
    #[arg(long)]
    base_url: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    NanoBanana,
    NanoBananaPro,
}

impl From<ModelArg> for GeminiModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::NanoBanana => GeminiModel::NanoBanana,
            ModelArg::NanoBananaPro => GeminiModel::NanoBananaPro,
        }
    }
}

impl ServiceArgs {
    fn build_provider(&self) -> spritegen::Result<GeminiProvider> {
        let mut builder = GeminiProvider::builder().model(self.model.into());
        if let Some(ref url) = self.base_url {
            builder = builder.base_url(url);
        }
        builder.build()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => generate(args, cli.json).await,
        Commands::Prompt => {
            println!("{SPRITE_SHEET_PROMPT}");
            Ok(())
        }
        Commands::Check(args) => check(args, cli.json).await,
    }
}

async fn generate(args: GenerateArgs, json_output: bool) -> anyhow::Result<()> {
    // A missing key is fatal before anything else happens
    let provider = match args.service.build_provider() {
        Ok(provider) => provider,
        Err(e) => return fail(&e.to_string(), json_output),
    };
    let model = provider.model();
    let mut app = App::new(provider);

    let mut file = UploadFile::new(&args.input);
    if let Some(ref ct) = args.content_type {
        file = file.with_content_type(ct);
    }

    if let Err(e) = app.upload(&file).await {
        return fail(&e.user_message(), json_output);
    }

    app.generate().await;

    if let Some(message) = app.state().error() {
        return fail(message, json_output);
    }

    let path = match app.save_result(&args.output) {
        Ok(Some(path)) => path,
        Ok(None) => return fail(spritegen::GENERATION_FAILED_MESSAGE, json_output),
        Err(e) => return fail(&e.user_message(), json_output),
    };
    let preview = match app.state().result() {
        Some(url) if args.preview => {
            match spritegen::present::save_preview(url, &args.output) {
                Ok(preview) => Some(preview),
                Err(e) => return fail(&e.user_message(), json_output),
            }
        }
        _ => None,
    };

    if json_output {
        let result = serde_json::json!({
            "success": true,
            "input": args.input.display().to_string(),
            "output": path.display().to_string(),
            "preview": preview.as_ref().map(|p| p.display().to_string()),
            "model": model.as_str(),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Sprite sheet: {}", path.display());
        if let Some(preview) = preview {
            println!("Preview: {}", preview.display());
        }
    }

    Ok(())
}

async fn check(args: ServiceArgs, json_output: bool) -> anyhow::Result<()> {
    let provider = match args.build_provider() {
        Ok(provider) => provider,
        Err(e) => return fail(&e.to_string(), json_output),
    };
    let outcome = provider.health_check().await;

    if json_output {
        let result = serde_json::json!({
            "provider": provider.name(),
            "model": provider.model().as_str(),
            "ok": outcome.is_ok(),
            "error": outcome.as_ref().err().map(|e| e.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if outcome.is_ok() {
        println!("{} ({}) is reachable", provider.name(), provider.model());
    }

    outcome?;
    Ok(())
}

/// Reports a user-facing failure and exits non-zero.
fn fail(message: &str, json_output: bool) -> anyhow::Result<()> {
    if json_output {
        let result = serde_json::json!({ "success": false, "error": message });
        println!("{}", serde_json::to_string_pretty(&result)?);
        std::process::exit(1);
    }
    anyhow::bail!("{message}")
}
