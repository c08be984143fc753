//! Image encoding: file on disk → base64 string + MIME type.
//!
//! Chat-completion APIs accept images as base64 data URIs embedded in the
//! JSON body. The MIME type is taken from the file extension alone
//! (lower-cased); the bytes are never sniffed.

use crate::error::MarkupError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// An image ready to be embedded in a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Standard-alphabet, padded base64 of the file bytes.
    pub data: String,
    /// `image/<extension>`.
    pub mime_type: String,
}

impl EncodedImage {
    /// Encode bytes that are already in memory.
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            data: STANDARD.encode(bytes),
            mime_type: mime_type.into(),
        }
    }

    /// `data:<mime>;base64,<data>`
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Derive `image/<ext>` from a path. A path without an extension yields
/// `image/`.
pub fn mime_type_for(path: &Path) -> String {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    format!("image/{ext}")
}

/// Read an image file and encode it.
///
/// # Errors
/// [`MarkupError::ImageNotFound`] when the path does not exist,
/// [`MarkupError::PermissionDenied`] when it cannot be opened, and
/// [`MarkupError::ImageReadFailed`] for any other read failure.
pub async fn encode_image_file(path: impl AsRef<Path>) -> Result<EncodedImage, MarkupError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => MarkupError::ImageNotFound {
            path: path.to_path_buf(),
        },
        ErrorKind::PermissionDenied => MarkupError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => MarkupError::ImageReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let image = EncodedImage::from_bytes(&bytes, mime_type_for(path));
    debug!(
        "Encoded {} ({} bytes) → {} bytes base64",
        path.display(),
        bytes.len(),
        image.data.len()
    );
    Ok(image)
}
