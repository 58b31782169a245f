//! Index error types
//!
//! Error codes:
//! - AERO_INDEX_INVALID_ARGUMENT (ERROR)
//! - AERO_INDEX_UNKNOWN_CURSOR (ERROR)
//! - AERO_INDEX_MALFORMED_CURSOR (ERROR)
//! - AERO_INDEX_CONFIG_INVALID (FATAL)
//!
//! Scan errors are raised at the call boundary, before any traversal.
//! None of them are retryable at this layer.

use std::fmt;

use thiserror::Error;

/// Severity levels for index errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The request is rejected; the store is unaffected
    Error,
    /// The store cannot be constructed
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Errors raised by the ordered index store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// Malformed scan arguments
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Cursor names a record key the index has never held (or has forgotten)
    #[error("Unknown cursor: no live or retired entry for record key {0}")]
    UnknownCursor(String),

    /// Cursor token failed to decode or verify
    #[error("Malformed cursor: {0}")]
    MalformedCursor(String),

    /// Configuration failed to load or validate
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl IndexError {
    /// Cursor combined with a range whose both bounds are exclusive
    pub fn cursor_with_open_range() -> Self {
        IndexError::InvalidArgument(
            "cursor is not supported when both range bounds are exclusive".to_string(),
        )
    }

    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            IndexError::InvalidArgument(_) => "AERO_INDEX_INVALID_ARGUMENT",
            IndexError::UnknownCursor(_) => "AERO_INDEX_UNKNOWN_CURSOR",
            IndexError::MalformedCursor(_) => "AERO_INDEX_MALFORMED_CURSOR",
            IndexError::Config(_) => "AERO_INDEX_CONFIG_INVALID",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            IndexError::Config(_) => Severity::Fatal,
            _ => Severity::Error,
        }
    }

    /// Returns whether this is a fatal error
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            IndexError::InvalidArgument("x".into()).code(),
            "AERO_INDEX_INVALID_ARGUMENT"
        );
        assert_eq!(
            IndexError::UnknownCursor("00".into()).code(),
            "AERO_INDEX_UNKNOWN_CURSOR"
        );
        assert_eq!(
            IndexError::MalformedCursor("x".into()).code(),
            "AERO_INDEX_MALFORMED_CURSOR"
        );
        assert_eq!(IndexError::Config("x".into()).code(), "AERO_INDEX_CONFIG_INVALID");
    }

    #[test]
    fn test_only_config_errors_are_fatal() {
        assert!(IndexError::Config("bad".into()).is_fatal());
        assert!(!IndexError::cursor_with_open_range().is_fatal());
        assert!(!IndexError::UnknownCursor("01".into()).is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = IndexError::cursor_with_open_range();
        let display = format!("{}", err);
        assert!(display.contains("Invalid argument"));
        assert!(display.contains("exclusive"));
        assert_eq!(err.severity().to_string(), "ERROR");
    }
}
