//! Result types returned by the `pdf2html` pipeline.

use crate::error::PageError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-indexed page number.
    pub page_num: usize,
    /// The rasterised PNG that was sent.
    pub image_path: PathBuf,
    /// Extracted markup; empty when `error` is set.
    pub markup: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub duration_ms: u64,
    /// Set only under [`crate::config::PageFailurePolicy::Skip`].
    pub error: Option<PageError>,
}

impl PageResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate numbers for a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    pub total_pages: usize,
    pub processed_pages: usize,
    pub failed_pages: usize,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_duration_ms: u64,
    pub render_duration_ms: u64,
}

/// Everything produced by [`crate::convert::convert_pdf`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Combined document: each successful page's markup followed by `\n`.
    pub html: String,
    pub pages: Vec<PageResult>,
    pub stats: ConversionStats,
}
