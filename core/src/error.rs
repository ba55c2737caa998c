//! Error type shared by the dictionary store, rule table and segmenter.
//!
//! Every recoverable failure surfaces as a `CwsError` value to the immediate
//! caller; setters that fail leave the previous configuration in place.

use std::path::{Path, PathBuf};

/// Result alias used across libcws.
pub type Result<T, E = CwsError> = std::result::Result<T, E>;

/// Errors reported by libcws operations.
#[derive(Debug, thiserror::Error)]
pub enum CwsError {
    /// The engine could not be constructed from its configuration.
    #[error("segmenter unavailable: {0}")]
    Unavailable(String),

    /// A dictionary or rule file is missing, unreadable or malformed.
    #[error("failed to load {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    /// A query was issued before any text was submitted.
    #[error("no text has been submitted")]
    NotConfigured,

    /// Charset name outside of {utf8, gbk}.
    #[error("unsupported charset: {0}")]
    InvalidCharset(String),

    /// Dictionary or multi-mode value out of range.
    #[error("invalid mode: {0}")]
    InvalidMode(String),

    /// Input bytes are not valid in the active charset.
    #[error("cannot decode input: {0}")]
    Decode(String),

    /// The segmenter was closed.
    #[error("segmenter is closed")]
    Closed,
}

impl CwsError {
    /// Build a `Load` error for `path`.
    pub fn load<P: AsRef<Path>, R: ToString>(path: P, reason: R) -> Self {
        CwsError::Load {
            path: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }
}
