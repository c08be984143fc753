//! PDF rasterisation via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and is not safe to drive from async tasks.
//! `tokio::task::spawn_blocking` moves the render loop onto the blocking pool
//! so the runtime's worker threads keep serving the HTTP client.
//!
//! Pages are rendered at a fixed DPI (200 by default) and saved as PNG, one
//! file per page, in page order.

use crate::error::MarkupError;
use crate::pipeline::input::{page_image_path, PageRasterizer};
use async_trait::async_trait;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an explicit pdfium library file.
pub const PDFIUM_LIB_PATH_VAR: &str = "PDFIUM_LIB_PATH";

/// Production [`PageRasterizer`] backed by pdfium.
#[derive(Debug, Clone)]
pub struct PdfiumRasterizer {
    dpi: u32,
    library_path: Option<PathBuf>,
}

impl PdfiumRasterizer {
    /// Rasteriser rendering at `dpi` dots per inch. pdfium is located through
    /// `PDFIUM_LIB_PATH`, the working directory, then the system library path.
    pub fn new(dpi: u32) -> Self {
        Self {
            dpi,
            library_path: None,
        }
    }

    /// Bind to this pdfium library file instead of searching for one.
    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = Some(path.into());
        self
    }
}

#[async_trait]
impl PageRasterizer for PdfiumRasterizer {
    async fn rasterise(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, MarkupError> {
        let pdf = pdf.to_path_buf();
        let out_dir = out_dir.to_path_buf();
        let dpi = self.dpi;
        let library_path = self.library_path.clone();

        tokio::task::spawn_blocking(move || {
            rasterise_blocking(&pdf, &out_dir, dpi, library_path.as_deref())
        })
        .await
        .map_err(|e| MarkupError::Internal(format!("Render task panicked: {}", e)))?
    }
}

/// Bind to pdfium: explicit path, then `PDFIUM_LIB_PATH`, then `./`, then
/// the system library.
fn bind_pdfium(library_path: Option<&Path>) -> Result<Pdfium, MarkupError> {
    let explicit = library_path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(PDFIUM_LIB_PATH_VAR).map(PathBuf::from));

    let bindings = match explicit {
        Some(path) => {
            debug!("Binding pdfium from {}", path.display());
            Pdfium::bind_to_library(&path)
        }
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| MarkupError::PdfiumBindingFailed(e.to_string()))?;

    Ok(Pdfium::new(bindings))
}

/// Blocking implementation of page rendering.
fn rasterise_blocking(
    pdf_path: &Path,
    out_dir: &Path,
    dpi: u32,
    library_path: Option<&Path>,
) -> Result<Vec<PathBuf>, MarkupError> {
    let pdfium = bind_pdfium(library_path)?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| MarkupError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: format!("{:?}", e),
        })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let render_config = PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / 72.0);

    let mut paths = Vec::with_capacity(total_pages);
    for (idx, page) in pages.iter().enumerate() {
        let page_num = idx + 1;

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            MarkupError::RasterisationFailed {
                page: page_num,
                detail: format!("{:?}", e),
            }
        })?;

        let image = bitmap.as_image();
        let path = page_image_path(out_dir, page_num);
        image
            .save_with_format(&path, image::ImageFormat::Png)
            .map_err(|e| MarkupError::PageSaveFailed {
                page: page_num,
                path: path.clone(),
                detail: e.to_string(),
            })?;

        debug!(
            "Rendered page {} → {}x{} px → {}",
            page_num,
            image.width(),
            image.height(),
            path.display()
        );
        paths.push(path);
    }

    Ok(paths)
}
