//! # vision-markup
//!
//! Turn PDF pages and standalone images into markup using a vision-capable
//! chat-completion API.
//!
//! Two pipelines share the same stages:
//!
//! ```text
//! pdf2html                              img2tei
//!  │                                     │
//!  ├─ 1. Input   PDF → page_N.png         ├─ 1. Input   argument or stdin prompt
//!  ├─ 2. Encode  PNG → base64 data URI    ├─ 2. Encode  image → base64 data URI
//!  ├─ 3. API     one POST per page        ├─ 3. API     one POST
//!  ├─ 4. Extract choices[0] content       ├─ 4. Extract content, unwrap ```xml
//!  └─ 5. Output  HTML file                └─ 5. Output  stdout
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vision_markup::{
//!     convert_pdf_to_file, ApiKey, ConversionConfig, OpenAiClient, PdfiumRasterizer,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let key = ApiKey::from_file("openai-api.key.txt")?;
//!     let client = OpenAiClient::new(key, &config.api.endpoint)?;
//!     let rasterizer = PdfiumRasterizer::new(config.dpi);
//!     let stats =
//!         convert_pdf_to_file("report.pdf", "report.html", &client, &rasterizer, &config).await?;
//!     eprintln!("{} pages", stats.processed_pages);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2html` and `img2tei` binaries (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod credentials;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ApiConfig, ConversionConfig, ConversionConfigBuilder, PageFailurePolicy, TranscriptionConfig};
pub use convert::{assemble_document, convert_pdf, convert_pdf_to_file, transcribe_and_report, transcribe_image};
pub use credentials::ApiKey;
pub use error::{MarkupError, PageError};
pub use output::{ConversionOutput, ConversionStats, PageResult};
pub use pipeline::encode::EncodedImage;
pub use pipeline::input::PageRasterizer;
pub use pipeline::llm::{ChatRequest, ChatResponse, OpenAiClient, VisionClient};
pub use pipeline::render::PdfiumRasterizer;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
