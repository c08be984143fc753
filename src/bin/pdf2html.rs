//! CLI binary: convert a PDF to HTML, one vision-model call per page.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig` and reports progress.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use vision_markup::{
    convert_pdf_to_file, ApiKey, ConversionConfig, ConversionProgressCallback, OpenAiClient,
    PageFailurePolicy, PdfiumRasterizer, ProgressCallback,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

static STDERR_IS_TTY: Lazy<bool> = Lazy::new(|| io::stderr().is_terminal());

fn paint(code: &str, s: &str, enabled: bool) -> String {
    if enabled {
        format!("\x1b[{code}m{s}\x1b[0m")
    } else {
        s.to_string()
    }
}
fn green(s: &str) -> String {
    paint("32", s, *STDERR_IS_TTY)
}
fn red(s: &str) -> String {
    paint("31", s, *STDERR_IS_TTY)
}
fn bold(s: &str) -> String {
    paint("1", s, *STDERR_IS_TTY)
}

/// How per-page progress is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProgressMode {
    /// Nothing but errors.
    Quiet,
    /// indicatif bar on stderr, page lines on stdout above it.
    Bar,
    /// One `Processing page N...` line per page on stdout.
    Plain,
}

/// The bar is only drawn on a terminal; indicatif hides it (and swallows
/// `println`) otherwise.
fn progress_mode(quiet: bool, no_progress: bool, stderr_is_tty: bool) -> ProgressMode {
    if quiet {
        ProgressMode::Quiet
    } else if no_progress || !stderr_is_tty {
        ProgressMode::Plain
    } else {
        ProgressMode::Bar
    }
}

// ── CLI progress callback ────────────────────────────────────────────────────

/// Prints `Processing page N...` above a progress bar.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_prefix("Rasterising");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} pages  ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        self.bar.set_length(total_pages as u64);
        self.bar.set_prefix("Converting");
    }

    fn on_page_start(&self, page_num: usize, _total_pages: usize) {
        self.bar.suspend(|| println!("Processing page {page_num}..."));
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, _page_num: usize, _total_pages: usize, _markup_len: usize) {
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, _total_pages: usize, error: &str) {
        self.bar
            .suspend(|| eprintln!("  {} page {}: {}", red("✗"), page_num, error));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, _total_pages: usize, _success_count: usize) {
        self.bar.finish_and_clear();
    }
}

/// Plain-text callback used with `--no-progress` or when stderr is not a
/// terminal.
struct PlainProgressCallback;

impl ConversionProgressCallback for PlainProgressCallback {
    fn on_page_start(&self, page_num: usize, _total_pages: usize) {
        println!("Processing page {page_num}...");
    }

    fn on_page_error(&self, page_num: usize, _total_pages: usize, error: &str) {
        eprintln!("  {} page {}: {}", red("✗"), page_num, error);
    }
}

/// Convert a PDF to HTML using a vision-capable chat-completion API.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2html",
    version,
    about = "Convert PDF to HTML using the OpenAI Vision API",
    color = clap::ColorChoice::Auto
)]
struct Cli {
    /// Path to the input PDF file.
    input_pdf: PathBuf,

    /// Path to the output HTML file.
    output_html: PathBuf,

    /// Path to the file holding the API key.
    #[arg(
        long = "api-key-file",
        alias = "api_key_file",
        env = "PDF2HTML_API_KEY_FILE",
        default_value = "openai-api.key.txt"
    )]
    api_key_file: PathBuf,

    /// Vision model ID.
    #[arg(long, env = "PDF2HTML_MODEL", default_value = vision_markup::config::DEFAULT_HTML_MODEL)]
    model: String,

    /// Max output tokens per page.
    #[arg(long, env = "PDF2HTML_MAX_TOKENS", default_value_t = vision_markup::config::DEFAULT_HTML_MAX_TOKENS)]
    max_tokens: u32,

    /// Chat-completion endpoint URL.
    #[arg(long, env = "PDF2HTML_ENDPOINT", default_value = vision_markup::config::DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Directory for the rasterised page images.
    #[arg(long, env = "PDF2HTML_WORK_DIR", default_value = vision_markup::config::DEFAULT_WORK_DIR)]
    work_dir: PathBuf,

    /// Rendering DPI (72–400).
    #[arg(long, env = "PDF2HTML_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Explicit pdfium shared library to bind to.
    #[arg(long, env = "PDF2HTML_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,

    /// Path to a text file containing a custom instruction.
    #[arg(long, env = "PDF2HTML_PROMPT_FILE")]
    prompt_file: Option<PathBuf>,

    /// What to do when a page fails: abort the run, or skip the page.
    #[arg(long, env = "PDF2HTML_ON_PAGE_ERROR", value_enum, default_value = "abort")]
    on_page_error: PolicyArg,

    /// Disable the progress bar.
    #[arg(long, env = "PDF2HTML_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2HTML_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2HTML_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum PolicyArg {
    Abort,
    Skip,
}

impl From<PolicyArg> for PageFailurePolicy {
    fn from(v: PolicyArg) -> Self {
        match v {
            PolicyArg::Abort => PageFailurePolicy::Abort,
            PolicyArg::Skip => PageFailurePolicy::Skip,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let mode = progress_mode(cli.quiet, cli.no_progress, *STDERR_IS_TTY);
    let filter = if cli.verbose {
        "debug"
    } else if mode == ProgressMode::Quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Credential + client ──────────────────────────────────────────────
    let api_key = ApiKey::from_file(&cli.api_key_file).context("Failed to load API key")?;

    let bar_cb = (mode == ProgressMode::Bar).then(CliProgressCallback::new);
    let progress_cb: Option<ProgressCallback> = match (mode, &bar_cb) {
        (ProgressMode::Quiet, _) => None,
        (_, Some(cb)) => Some(cb.clone() as Arc<dyn ConversionProgressCallback>),
        (_, None) => Some(Arc::new(PlainProgressCallback) as Arc<dyn ConversionProgressCallback>),
    };

    let config = build_config(&cli, progress_cb).await?;
    let client = OpenAiClient::new(api_key, &config.api.endpoint)
        .context("Failed to create API client")?;
    let mut rasterizer = PdfiumRasterizer::new(config.dpi);
    if let Some(ref lib) = cli.pdfium_lib {
        rasterizer = rasterizer.with_library_path(lib);
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let result = convert_pdf_to_file(
        &cli.input_pdf,
        &cli.output_html,
        &client,
        &rasterizer,
        &config,
    )
    .await;
    if let (Err(_), Some(cb)) = (&result, &bar_cb) {
        cb.bar.finish_and_clear();
    }
    let stats = result.context("Conversion failed")?;

    if !cli.quiet {
        println!("HTML output saved to {}", cli.output_html.display());
        if stats.failed_pages > 0 {
            eprintln!(
                "{} {}/{} pages converted  ({} skipped)",
                red("⚠"),
                bold(&stats.processed_pages.to_string()),
                stats.total_pages,
                stats.failed_pages,
            );
        } else {
            eprintln!(
                "{} {} pages  {}ms  {} tokens in / {} tokens out",
                green("✔"),
                stats.processed_pages,
                stats.total_duration_ms,
                stats.total_input_tokens,
                stats.total_output_tokens,
            );
        }
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .endpoint(&cli.endpoint)
        .model(&cli.model)
        .max_tokens(Some(cli.max_tokens))
        .work_dir(&cli.work_dir)
        .dpi(cli.dpi)
        .on_page_error(cli.on_page_error.clone().into());

    if let Some(ref path) = cli.prompt_file {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt from {:?}", path))?;
        builder = builder.prompt(prompt);
    }

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
