//! Error types for the persistence boundary.
//!
//! The render path never fails: absent settings fall back to neutral values,
//! degenerate geometry is clamped and tools that cannot produce a mask are
//! skipped. Errors only surface when decoding persisted payloads or building
//! rasters from caller-supplied buffers.

use thiserror::Error;

/// Errors raised while decoding persisted edit state or raw buffers.
#[derive(Debug, Error)]
pub enum EditError {
    /// A persisted mask bitmap could not be decoded.
    #[error("Invalid mask blob: {0}")]
    InvalidBlob(String),

    /// A persisted setting has a value of the wrong shape.
    #[error("Invalid value for setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    /// A pixel buffer does not match the declared dimensions.
    #[error("Buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSize { expected: usize, actual: usize },

    /// PNG encoding or decoding failed.
    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),

    /// The settings document is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A base64 payload is malformed.
    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl EditError {
    pub(crate) fn setting(key: &str, reason: impl Into<String>) -> Self {
        EditError::InvalidSetting {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
