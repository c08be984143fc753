//! Input acquisition.
//!
//! * `pdf2html` turns a PDF into an ordered list of page images on disk via a
//!   [`PageRasterizer`]. The images land in a working directory under
//!   deterministic names (`page_1.png`, `page_2.png`, …) so a run can be
//!   inspected afterwards; the directory is reused across runs.
//! * `img2tei` takes one path from the command line, or asks for it on
//!   stdin. The path is not checked here; a bad path surfaces when the
//!   encoder reads it.

use crate::error::MarkupError;
use crate::prompts::IMAGE_PATH_PROMPT;
use async_trait::async_trait;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Renders a PDF into one PNG per page.
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    /// Write every page of `pdf` into `out_dir` as
    /// [`page_image_path`]`(out_dir, n)` and return the paths in page order.
    async fn rasterise(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, MarkupError>;
}

/// File name for 1-indexed page `page_num` inside `dir`.
pub fn page_image_path(dir: &Path, page_num: usize) -> PathBuf {
    dir.join(format!("page_{page_num}.png"))
}

/// Recover the page number from a path produced by [`page_image_path`].
pub fn page_number_from_path(path: &Path) -> Option<usize> {
    path.file_stem()?
        .to_str()?
        .strip_prefix("page_")?
        .parse()
        .ok()
}

/// Rasterise `pdf` into `work_dir`, creating the directory if needed.
///
/// # Errors
/// [`MarkupError::PdfNotFound`] if the PDF is missing,
/// [`MarkupError::PermissionDenied`] or [`MarkupError::PdfUnreadable`] if its
/// path cannot be inspected, [`MarkupError::WorkDirFailed`] if the directory cannot be created, and
/// whatever the rasteriser reports for unreadable documents or pages.
pub async fn acquire_pages(
    rasterizer: &dyn PageRasterizer,
    pdf: &Path,
    work_dir: &Path,
) -> Result<Vec<PathBuf>, MarkupError> {
    match tokio::fs::try_exists(pdf).await {
        Ok(true) => {}
        Ok(false) => {
            return Err(MarkupError::PdfNotFound {
                path: pdf.to_path_buf(),
            })
        }
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            return Err(MarkupError::PermissionDenied {
                path: pdf.to_path_buf(),
            })
        }
        Err(source) => {
            return Err(MarkupError::PdfUnreadable {
                path: pdf.to_path_buf(),
                source,
            })
        }
    }

    tokio::fs::create_dir_all(work_dir)
        .await
        .map_err(|source| MarkupError::WorkDirFailed {
            path: work_dir.to_path_buf(),
            source,
        })?;
    debug!("Page images go to {}", work_dir.display());

    let pages = rasterizer.rasterise(pdf, work_dir).await?;
    info!("Rasterised {} pages from {}", pages.len(), pdf.display());
    Ok(pages)
}

/// Return `arg` unchanged, or prompt on `prompt_out` and read one line from
/// `input`.
///
/// Only the line terminator is removed from the typed path. End of input
/// before any byte is read is reported as [`io::ErrorKind::UnexpectedEof`].
pub fn resolve_image_path<R, W>(
    arg: Option<String>,
    input: &mut R,
    prompt_out: &mut W,
) -> io::Result<PathBuf>
where
    R: BufRead,
    W: Write,
{
    if let Some(path) = arg {
        return Ok(PathBuf::from(path));
    }

    prompt_out.write_all(IMAGE_PATH_PROMPT.as_bytes())?;
    prompt_out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "no image path entered",
        ));
    }
    let trimmed = line.strip_suffix('\n').unwrap_or(&line);
    let trimmed = trimmed.strip_suffix('\r').unwrap_or(trimmed);
    Ok(PathBuf::from(trimmed))
}
