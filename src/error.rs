//! Error types for the vision-markup library.
//!
//! Two error types reflect two failure modes:
//!
//! * [`MarkupError`] — **Fatal**: the run cannot continue (unreadable key
//!   file, PDF that pdfium refuses, API call that failed while the page
//!   policy is `Abort`). Returned as `Err(MarkupError)` from the pipeline
//!   entry points.
//!
//! * [`PageError`] — **Non-fatal**: one page failed while the conversion runs
//!   with [`crate::config::PageFailurePolicy::Skip`]. Stored inside
//!   [`crate::output::PageResult`] so callers can see which pages are missing
//!   from the assembled document.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the vision-markup library.
#[derive(Debug, Error)]
pub enum MarkupError {
    // ── Credential errors ─────────────────────────────────────────────────
    /// The API key file could not be read.
    #[error("Failed to read API key file '{path}': {source}")]
    CredentialFileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The environment variable holding the API key is not set.
    #[error("Environment variable {var} is not set.\nTry: export {var}=sk-...")]
    CredentialEnvMissing { var: String },

    /// The key source exists but holds nothing once whitespace is trimmed.
    #[error("API key from {source_name} is empty")]
    EmptyCredential { source_name: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// The PDF to rasterise does not exist.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    PdfNotFound { path: PathBuf },

    /// The PDF path exists in some form but cannot be inspected.
    #[error("Cannot access PDF '{path}': {source}")]
    PdfUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The image to encode does not exist.
    #[error("Image file not found: '{path}'")]
    ImageNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// Any other I/O failure while reading an image.
    #[error("Failed to read image '{path}': {source}")]
    ImageReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Rasterisation errors ──────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Place libpdfium next to the binary, install it system-wide,\n\
or set PDFIUM_LIB_PATH=/path/to/libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    /// pdfium could not open the document.
    #[error("PDF '{path}' could not be opened: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// pdfium failed to render a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// The rendered page could not be written as PNG.
    #[error("Failed to save page {page} to '{path}': {detail}")]
    PageSaveFailed {
        page: usize,
        path: PathBuf,
        detail: String,
    },

    /// The page-image working directory could not be created.
    #[error("Failed to create working directory '{path}': {source}")]
    WorkDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── API errors ────────────────────────────────────────────────────────
    /// The HTTP request never produced a response (DNS, TLS, connection reset…).
    #[error("Request to '{endpoint}' failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-2xx status.
    #[error("API returned HTTP {status}: {body}")]
    ApiStatus { status: u16, body: String },

    /// The response body is not the expected chat-completion JSON.
    #[error("Malformed API response: {0}")]
    MalformedResponse(String),

    /// The response parsed, but carries no generated text.
    #[error("API response contains no message content")]
    MissingContent,

    /// Every page failed while running with the `Skip` policy.
    #[error("All {total} pages failed.\nFirst error: {first_error}")]
    AllPagesFailed { total: usize, first_error: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The image could not be read or encoded.
    #[error("Page {page}: encoding failed: {detail}")]
    EncodeFailed { page: usize, detail: String },

    /// The API call or response extraction failed.
    #[error("Page {page}: API call failed: {detail}")]
    ApiFailed { page: usize, detail: String },
}

impl PageError {
    /// 1-indexed page number the error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::EncodeFailed { page, .. } | PageError::ApiFailed { page, .. } => *page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_status_display() {
        let e = MarkupError::ApiStatus {
            status: 401,
            body: "invalid api key".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("401"), "got: {msg}");
        assert!(msg.contains("invalid api key"));
    }

    #[test]
    fn env_missing_display_names_variable() {
        let e = MarkupError::CredentialEnvMissing {
            var: "OPENAI_API_KEY".into(),
        };
        assert!(e.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn image_not_found_display() {
        let e = MarkupError::ImageNotFound {
            path: PathBuf::from("scan.jpg"),
        };
        assert!(e.to_string().contains("scan.jpg"));
    }

    #[test]
    fn page_error_reports_page() {
        let e = PageError::ApiFailed {
            page: 4,
            detail: "HTTP 500".into(),
        };
        assert_eq!(e.page(), 4);
        assert!(e.to_string().contains("Page 4"));
    }
}
