//! Error types for the session host.

use luxedit_core::EditError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// An image with no pixels cannot be edited.
    #[error("Image has no pixels")]
    EmptyRaster,

    /// Persisted edit state failed to decode.
    #[error(transparent)]
    Core(#[from] EditError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_convert_transparently() {
        let core = EditError::InvalidBlob("empty".to_string());
        let message = core.to_string();
        let err: SessionError = core.into();
        assert!(matches!(err, SessionError::Core(_)));
        assert_eq!(err.to_string(), message, "Core errors display unchanged");
    }
}
