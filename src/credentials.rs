//! API key loading.
//!
//! The key is read once at startup and then handed to
//! [`crate::pipeline::llm::OpenAiClient`]. It is never written anywhere, and
//! its `Debug` output is redacted so it cannot leak through tracing spans or
//! `{:?}` dumps of a config.

use crate::error::MarkupError;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Environment variable read by `img2tei`.
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";

/// An opaque API key.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap an already-obtained key. Surrounding whitespace is removed.
    pub fn new(key: impl AsRef<str>) -> Result<Self, MarkupError> {
        Self::checked(key.as_ref(), "argument")
    }

    /// Read a plaintext key file and trim surrounding whitespace.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MarkupError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| {
            MarkupError::CredentialFileUnreadable {
                path: path.to_path_buf(),
                source,
            }
        })?;
        debug!("Loaded API key from {}", path.display());
        Self::checked(&raw, &path.display().to_string())
    }

    /// Read the key from an environment variable.
    pub fn from_env(var: &str) -> Result<Self, MarkupError> {
        let raw = std::env::var(var).map_err(|_| MarkupError::CredentialEnvMissing {
            var: var.to_string(),
        })?;
        Self::checked(&raw, var)
    }

    /// The raw key, for the `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }

    fn checked(raw: &str, source_name: &str) -> Result<Self, MarkupError> {
        let key = raw.trim();
        if key.is_empty() {
            return Err(MarkupError::EmptyCredential {
                source_name: source_name.to_string(),
            });
        }
        Ok(Self(key.to_string()))
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}
