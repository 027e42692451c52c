//! Error types for storage backends
//!
//! Provides unified error handling using thiserror.
//!
//! These errors never escape the public cache API: the store catches every
//! backend failure and degrades to a miss or a `false` return. They exist so
//! the internal plumbing can use `Result` and `?` instead of sentinel values.

use thiserror::Error;

// == Backend Error Enum ==
/// Unified error type for storage backend operations.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend refused a write because its quota is exhausted
    #[error("storage quota exceeded")]
    QuotaExceeded,

    /// The backend mechanism cannot be used at all (absent, access denied)
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// An I/O failure from a file-based backend
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend's persisted state is not valid JSON
    #[error("corrupt backend state: {0}")]
    Corrupt(#[from] serde_json::Error),
}

// == Result Type Alias ==
/// Convenience Result type for backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            BackendError::QuotaExceeded.to_string(),
            "storage quota exceeded"
        );
        assert_eq!(
            BackendError::Unavailable("disabled by policy".to_string()).to_string(),
            "storage unavailable: disabled by policy"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: BackendError = io.into();
        assert!(matches!(err, BackendError::Io(_)));
    }
}
