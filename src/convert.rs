//! Pipeline entry points.
//!
//! * [`convert_pdf`] / [`convert_pdf_to_file`] — `pdf2html`: rasterise every
//!   page, send each page image in turn, concatenate the returned HTML.
//! * [`transcribe_image`] / [`transcribe_and_report`] — `img2tei`: send one
//!   image, unwrap the fenced XML.
//!
//! Both take the [`VisionClient`] as an argument instead of building one, so
//! the process constructs its client once and tests substitute a double.

use crate::config::{ConversionConfig, PageFailurePolicy, TranscriptionConfig};
use crate::error::{MarkupError, PageError};
use crate::output::{ConversionOutput, ConversionStats, PageResult};
use crate::pipeline::encode::encode_image_file;
use crate::pipeline::input::{acquire_pages, page_number_from_path, PageRasterizer};
use crate::pipeline::llm::{build_vision_request, Usage, VisionClient};
use crate::pipeline::postprocess::{extract_content, extract_xml_block};
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert a PDF into one HTML document, page by page.
///
/// Pages are processed strictly in order, one request at a time.
///
/// # Errors
/// Fatal errors from rasterisation always abort. Page failures abort under
/// [`PageFailurePolicy::Abort`]; under [`PageFailurePolicy::Skip`] they are
/// recorded in [`PageResult::error`] and the run fails only if every page
/// failed.
pub async fn convert_pdf(
    input_pdf: impl AsRef<Path>,
    client: &dyn VisionClient,
    rasterizer: &dyn PageRasterizer,
    config: &ConversionConfig,
) -> Result<ConversionOutput, MarkupError> {
    let total_start = Instant::now();
    let input_pdf = input_pdf.as_ref();
    info!("Starting conversion: {}", input_pdf.display());

    // ── Step 1: Rasterise pages ──────────────────────────────────────────
    let render_start = Instant::now();
    let page_paths = acquire_pages(rasterizer, input_pdf, &config.work_dir).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    let total_pages = page_paths.len();

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(total_pages);
    }

    // ── Step 2: Encode + convert each page ───────────────────────────────
    let mut pages = Vec::with_capacity(total_pages);
    for (idx, path) in page_paths.iter().enumerate() {
        let page_num = page_number_from_path(path).unwrap_or(idx + 1);
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page_num, total_pages);
        }
        info!("Page {}/{}: {}", page_num, total_pages, path.display());

        let start = Instant::now();
        match process_page(client, path, config).await {
            Ok((markup, usage)) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_complete(page_num, total_pages, markup.len());
                }
                pages.push(PageResult {
                    page_num,
                    image_path: path.clone(),
                    markup,
                    input_tokens: usage.prompt_tokens,
                    output_tokens: usage.completion_tokens,
                    duration_ms: start.elapsed().as_millis() as u64,
                    error: None,
                });
            }
            Err(failure) => {
                let page_error = failure.to_page_error(page_num);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_error(page_num, total_pages, &page_error.to_string());
                }
                match config.on_page_error {
                    PageFailurePolicy::Abort => return Err(failure.into_inner()),
                    PageFailurePolicy::Skip => {
                        warn!("Skipping page {}: {}", page_num, page_error);
                        pages.push(PageResult {
                            page_num,
                            image_path: path.clone(),
                            markup: String::new(),
                            input_tokens: 0,
                            output_tokens: 0,
                            duration_ms: start.elapsed().as_millis() as u64,
                            error: Some(page_error),
                        });
                    }
                }
            }
        }
    }

    // ── Step 3: Assemble ─────────────────────────────────────────────────
    let processed = pages.iter().filter(|p| p.is_success()).count();
    let failed = pages.len() - processed;

    if processed == 0 && failed > 0 {
        let first_error = pages
            .iter()
            .find_map(|p| p.error.as_ref())
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(MarkupError::AllPagesFailed {
            total: pages.len(),
            first_error,
        });
    }

    let html = assemble_document(&pages);
    let stats = ConversionStats {
        total_pages,
        processed_pages: processed,
        failed_pages: failed,
        total_input_tokens: pages.iter().map(|p| p.input_tokens as u64).sum(),
        total_output_tokens: pages.iter().map(|p| p.output_tokens as u64).sum(),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        render_duration_ms,
    };

    info!(
        "Conversion complete: {}/{} pages, {}ms total",
        processed, total_pages, stats.total_duration_ms
    );

    Ok(ConversionOutput { html, pages, stats })
}

/// Convert a PDF and write the combined HTML to `output_path`, replacing any
/// existing file.
///
/// The document is written to a temp file in the same directory and renamed
/// into place, so an aborted run never leaves a half-written output. The
/// parent directory is not created.
pub async fn convert_pdf_to_file(
    input_pdf: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    client: &dyn VisionClient,
    rasterizer: &dyn PageRasterizer,
    config: &ConversionConfig,
) -> Result<ConversionStats, MarkupError> {
    let output = convert_pdf(input_pdf, client, rasterizer, config).await?;
    let path = output_path.as_ref();
    write_output(path, &output.html).await?;
    info!("HTML output saved to {}", path.display());

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(output.stats.total_pages, output.stats.processed_pages);
    }
    Ok(output.stats)
}

/// Join successful pages, each followed by a newline.
pub fn assemble_document(pages: &[PageResult]) -> String {
    let mut html = String::new();
    for page in pages.iter().filter(|p| p.is_success()) {
        html.push_str(&page.markup);
        html.push('\n');
    }
    html
}

/// Transcribe one image to TEI XML.
///
/// Returns `Ok(None)` when the API answers with no choices at all, and the
/// fence-stripped text otherwise.
pub async fn transcribe_image(
    client: &dyn VisionClient,
    image_path: impl AsRef<Path>,
    config: &TranscriptionConfig,
) -> Result<Option<String>, MarkupError> {
    let image_path = image_path.as_ref();
    let image = encode_image_file(image_path).await?;
    let request = build_vision_request(config.prompt_text(), &image, &config.api);
    let response = client.complete(&request).await?;

    if response.choices.is_empty() {
        warn!("No choices returned for {}", image_path.display());
        return Ok(None);
    }
    let content = extract_content(&response)?;
    Ok(Some(extract_xml_block(content)))
}

/// Transcribe one image and write the result to `out`.
///
/// Any transcription failure is written to `out` as
/// `Error processing image <path>: <error>` instead of being returned; only a
/// failure to write to `out` itself is an `Err`. Returns whether the image was
/// transcribed.
pub async fn transcribe_and_report<W: Write>(
    client: &dyn VisionClient,
    image_path: impl AsRef<Path>,
    config: &TranscriptionConfig,
    out: &mut W,
) -> std::io::Result<bool> {
    let image_path = image_path.as_ref();
    match transcribe_image(client, image_path, config).await {
        Ok(Some(xml)) => {
            writeln!(out, "{xml}")?;
            Ok(true)
        }
        Ok(None) => Ok(true),
        Err(e) => {
            debug!("Transcription failed: {e:?}");
            writeln!(out, "Error processing image {}: {}", image_path.display(), e)?;
            Ok(false)
        }
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Which stage a page failed in.
enum PageFailure {
    Encode(MarkupError),
    Api(MarkupError),
}

impl PageFailure {
    fn to_page_error(&self, page: usize) -> PageError {
        match self {
            PageFailure::Encode(e) => PageError::EncodeFailed {
                page,
                detail: e.to_string(),
            },
            PageFailure::Api(e) => PageError::ApiFailed {
                page,
                detail: e.to_string(),
            },
        }
    }

    fn into_inner(self) -> MarkupError {
        match self {
            PageFailure::Encode(e) | PageFailure::Api(e) => e,
        }
    }
}

async fn process_page(
    client: &dyn VisionClient,
    image_path: &Path,
    config: &ConversionConfig,
) -> Result<(String, Usage), PageFailure> {
    let image = encode_image_file(image_path)
        .await
        .map_err(PageFailure::Encode)?;
    let request = build_vision_request(config.prompt_text(), &image, &config.api);
    let response = client.complete(&request).await.map_err(PageFailure::Api)?;
    let markup = extract_content(&response)
        .map_err(PageFailure::Api)?
        .to_string();
    Ok((markup, response.usage.unwrap_or_default()))
}

async fn write_output(path: &Path, content: &str) -> Result<(), MarkupError> {
    let path = path.to_path_buf();
    let content = content.to_owned();
    tokio::task::spawn_blocking(move || persist_atomically(&path, content.as_bytes()))
        .await
        .map_err(|e| MarkupError::Internal(format!("Write task panicked: {}", e)))?
}

/// Write into an anonymous temp file next to `path`, then rename it over
/// `path`. The parent directory must already exist. On any failure the temp
/// file is removed and `path` is left as it was.
fn persist_atomically(path: &Path, content: &[u8]) -> Result<(), MarkupError> {
    let write_err = |source: std::io::Error| MarkupError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".vision-markup-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(write_err)?;
    tmp.write_all(content).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn page(page_num: usize, markup: &str, error: Option<PageError>) -> PageResult {
        PageResult {
            page_num,
            image_path: PathBuf::from(format!("page_{page_num}.png")),
            markup: markup.to_string(),
            input_tokens: 0,
            output_tokens: 0,
            duration_ms: 0,
            error,
        }
    }

    #[test]
    fn assemble_appends_newline_per_page() {
        let pages = vec![page(1, "<p>A</p>", None), page(2, "<p>B</p>", None)];
        assert_eq!(assemble_document(&pages), "<p>A</p>\n<p>B</p>\n");
    }

    #[test]
    fn assemble_skips_failed_pages() {
        let pages = vec![
            page(1, "<p>A</p>", None),
            page(
                2,
                "",
                Some(PageError::ApiFailed {
                    page: 2,
                    detail: "HTTP 500".into(),
                }),
            ),
            page(3, "<p>C</p>", None),
        ];
        assert_eq!(assemble_document(&pages), "<p>A</p>\n<p>C</p>\n");
    }

    #[test]
    fn assemble_empty_document() {
        assert_eq!(assemble_document(&[]), "");
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn write_output_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.html");
        write_output(&path, "first").await.unwrap();
        write_output(&path, "<p>é ✓ 𝔘</p>\n").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<p>é ✓ 𝔘</p>\n");
        assert_eq!(dir_entries(dir.path()), vec!["doc.html"]);
    }

    #[tokio::test]
    async fn write_output_missing_parent_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("doc.html");
        let err = write_output(&path, "<p/>").await.unwrap_err();
        match err {
            MarkupError::OutputWriteFailed { path: p, source } => {
                assert_eq!(p, path);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected OutputWriteFailed, got {other:?}"),
        }
        assert!(!dir.path().join("no_such_dir").exists());
    }

    #[tokio::test]
    async fn write_output_leaves_sibling_tmp_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.html");
        let user_tmp = dir.path().join("doc.html.tmp");
        std::fs::write(&user_tmp, "keep me").unwrap();

        write_output(&path, "<p>A</p>\n").await.unwrap();

        assert_eq!(std::fs::read_to_string(&user_tmp).unwrap(), "keep me");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<p>A</p>\n");
        assert_eq!(dir_entries(dir.path()), vec!["doc.html", "doc.html.tmp"]);
    }

    #[tokio::test]
    async fn write_output_failed_rename_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory where the file should go makes the rename fail.
        let path = dir.path().join("doc.html");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("inner.txt"), "x").unwrap();

        let err = write_output(&path, "<p/>").await.unwrap_err();
        assert!(matches!(err, MarkupError::OutputWriteFailed { .. }), "got {err:?}");
        assert_eq!(dir_entries(dir.path()), vec!["doc.html"]);
    }
}
