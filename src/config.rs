//! Configuration types for both pipelines.
//!
//! [`ApiConfig`] describes the chat-completion call shared by both
//! pipelines. [`ConversionConfig`] (built through
//! [`ConversionConfigBuilder`]) drives `pdf2html`; [`TranscriptionConfig`]
//! drives `img2tei`.
//!
//! The API client itself is not part of any config: it is constructed once by
//! the caller and passed to the pipeline functions, so tests can hand in a
//! scripted [`crate::pipeline::llm::VisionClient`].

use crate::error::MarkupError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Chat-completion endpoint used unless overridden.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Model used by `pdf2html`.
pub const DEFAULT_HTML_MODEL: &str = "gpt-4o-mini";

/// Model used by `img2tei`.
pub const DEFAULT_TEI_MODEL: &str = "gpt-4o";

/// Output-token ceiling sent by `pdf2html`.
pub const DEFAULT_HTML_MAX_TOKENS: u32 = 3000;

/// Directory that receives the rasterised `page_<n>.png` files.
pub const DEFAULT_WORK_DIR: &str = "pdf_images";

/// Parameters of the chat-completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Full URL of the chat-completion endpoint.
    pub endpoint: String,

    /// Vision-capable model identifier.
    pub model: String,

    /// `max_tokens` field of the request. Omitted from the body when `None`.
    pub max_tokens: Option<u32>,
}

impl ApiConfig {
    /// Request parameters for PDF page → HTML.
    pub fn html_defaults() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_HTML_MODEL.to_string(),
            max_tokens: Some(DEFAULT_HTML_MAX_TOKENS),
        }
    }

    /// Request parameters for image → TEI XML. No token ceiling is sent.
    pub fn tei_defaults() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_TEI_MODEL.to_string(),
            max_tokens: None,
        }
    }
}

/// What `pdf2html` does when a single page fails to encode or convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageFailurePolicy {
    /// Stop at the first failing page; nothing is written. (default)
    #[default]
    Abort,
    /// Log the failure, leave the page out of the document and continue.
    Skip,
}

/// Configuration for a PDF → HTML conversion.
///
/// # Example
/// ```rust
/// use vision_markup::{ConversionConfig, PageFailurePolicy};
///
/// let config = ConversionConfig::builder()
///     .dpi(150)
///     .work_dir("scratch/pages")
///     .on_page_error(PageFailurePolicy::Skip)
///     .build()
///     .unwrap();
/// assert_eq!(config.api.model, "gpt-4o-mini");
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Chat-completion parameters. Default: [`ApiConfig::html_defaults`].
    pub api: ApiConfig,

    /// Instruction override. If `None`, uses [`crate::prompts::HTML_PROMPT`].
    pub prompt: Option<String>,

    /// Where page images are written. Created if missing, reused otherwise.
    pub work_dir: PathBuf,

    /// Rendering DPI used when rasterising each page. Range: 72–400. Default: 200.
    pub dpi: u32,

    /// Behaviour on a failing page. Default: [`PageFailurePolicy::Abort`].
    pub on_page_error: PageFailurePolicy,

    /// Optional per-page event sink.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::html_defaults(),
            prompt: None,
            work_dir: PathBuf::from(DEFAULT_WORK_DIR),
            dpi: 200,
            on_page_error: PageFailurePolicy::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("api", &self.api)
            .field("prompt", &self.prompt)
            .field("work_dir", &self.work_dir)
            .field("dpi", &self.dpi)
            .field("on_page_error", &self.on_page_error)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The instruction text actually sent with each page.
    pub fn prompt_text(&self) -> &str {
        self.prompt.as_deref().unwrap_or(crate::prompts::HTML_PROMPT)
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.api.endpoint = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.api.model = model.into();
        self
    }

    /// `None` drops the field from the request body.
    pub fn max_tokens(mut self, n: Option<u32>) -> Self {
        self.config.api.max_tokens = n;
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = Some(prompt.into());
        self
    }

    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.work_dir = dir.into();
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn on_page_error(mut self, policy: PageFailurePolicy) -> Self {
        self.config.on_page_error = policy;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, MarkupError> {
        let c = &self.config;
        if c.api.endpoint.trim().is_empty() {
            return Err(MarkupError::InvalidConfig("endpoint must not be empty".into()));
        }
        if c.api.model.trim().is_empty() {
            return Err(MarkupError::InvalidConfig("model must not be empty".into()));
        }
        if c.api.max_tokens == Some(0) {
            return Err(MarkupError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if c.work_dir.as_os_str().is_empty() {
            return Err(MarkupError::InvalidConfig(
                "work_dir must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Configuration for a single image → TEI XML transcription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// Chat-completion parameters. Default: [`ApiConfig::tei_defaults`].
    pub api: ApiConfig,

    /// Instruction override. If `None`, uses [`crate::prompts::TEI_PROMPT`].
    pub prompt: Option<String>,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::tei_defaults(),
            prompt: None,
        }
    }
}

impl TranscriptionConfig {
    /// The instruction text actually sent with the image.
    pub fn prompt_text(&self) -> &str {
        self.prompt.as_deref().unwrap_or(crate::prompts::TEI_PROMPT)
    }
}
