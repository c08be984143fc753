//! Pipeline stages shared by `pdf2html` and `img2tei`.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the API client or rasteriser can be swapped for a test double.
//!
//! ## Data Flow
//!
//! ```text
//! input/render ──▶ encode ──▶ llm ──▶ postprocess
//! (PDF → PNGs,     (base64)   (HTTP)  (content, fence)
//!  or one path)
//! ```
//!
//! 1. [`input`]  — page-image acquisition for PDFs, path resolution for images
//! 2. [`render`] — pdfium rasteriser; runs in `spawn_blocking` because pdfium
//!    is not async-safe
//! 3. [`encode`] — read the image file and wrap it as base64 + MIME type
//! 4. [`llm`]    — request types, the [`llm::VisionClient`] seam and the
//!    reqwest-backed client; the only stage with network I/O
//! 5. [`postprocess`] — pull the generated text out of the response and unwrap
//!    a fenced block

pub mod encode;
pub mod input;
pub mod llm;
pub mod postprocess;
pub mod render;
