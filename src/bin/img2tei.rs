//! CLI binary: transcribe one image into TEI P5 XML and print it.
//!
//! The image path comes from the first argument, or is asked for on stdin.
//! A failed transcription is reported on stdout and the process still exits
//! successfully; only a missing API key is fatal.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vision_markup::credentials::OPENAI_API_KEY_VAR;
use vision_markup::pipeline::input::resolve_image_path;
use vision_markup::{transcribe_and_report, ApiKey, OpenAiClient, TranscriptionConfig};

/// Transcribe an image into TEI XML using the OpenAI API.
#[derive(Parser, Debug)]
#[command(name = "img2tei", version, about = "Transcribe an image into TEI XML using the OpenAI API")]
struct Cli {
    /// Path to the image file. Prompted for when omitted.
    image: Option<String>,

    /// Vision model ID.
    #[arg(long, env = "IMG2TEI_MODEL", default_value = vision_markup::config::DEFAULT_TEI_MODEL)]
    model: String,

    /// Chat-completion endpoint URL.
    #[arg(long, env = "IMG2TEI_ENDPOINT", default_value = vision_markup::config::DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Path to a text file containing a custom instruction.
    #[arg(long, env = "IMG2TEI_PROMPT_FILE")]
    prompt_file: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "IMG2TEI_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // The client is built once, before any input is read.
    let api_key = ApiKey::from_env(OPENAI_API_KEY_VAR).context("Failed to load API key")?;
    let client =
        OpenAiClient::new(api_key, &cli.endpoint).context("Failed to create API client")?;

    let mut config = TranscriptionConfig::default();
    config.api.model = cli.model.clone();
    config.api.endpoint = cli.endpoint.clone();
    if let Some(ref path) = cli.prompt_file {
        config.prompt = Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read prompt from {:?}", path))?,
        );
    }

    let image_path = {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut prompt_out = io::stdout();
        resolve_image_path(cli.image.clone(), &mut input, &mut prompt_out)
            .context("Failed to read image path")?
    };

    let mut stdout = io::stdout();
    transcribe_and_report(&client, &image_path, &config, &mut stdout)
        .await
        .context("Failed to write to stdout")?;
    stdout.flush().ok();

    Ok(())
}
