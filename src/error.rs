//! Crate-wide error type.
//!
//! Every layer returns `crate::error::Result<T>`. The orchestrator boundary is
//! the exception: it folds these errors into an `UploadFailure` so callers
//! always get a definite outcome.

use thiserror::Error;

use crate::models::upload::FailureKind;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Transport-level failure (DNS, connection reset, TLS).
    #[error("Network error: {0}")]
    Network(String),

    /// The remote service answered but refused the request.
    #[error("API error: {0}")]
    Api(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// Client-side pre-flight check failed.
    #[error("{0}")]
    Validation(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Failure category reported to the caller of an upload.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            AppError::Network(_) | AppError::Io(_) => FailureKind::Network,
            AppError::Api(_) => FailureKind::RemoteRejected,
            AppError::Timeout(_) => FailureKind::Timeout,
            AppError::Config(_) => FailureKind::Configuration,
            AppError::Validation(_) => FailureKind::Validation,
            AppError::Storage(_) | AppError::Archive(_) | AppError::Internal(_) => {
                FailureKind::Internal
            }
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout(err.to_string())
        } else if let Some(status) = err.status() {
            AppError::Api(format!("status={} {}", status.as_u16(), err))
        } else {
            AppError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON error: {}", err))
    }
}

impl From<zip::result::ZipError> for AppError {
    fn from(err: zip::result::ZipError) -> Self {
        AppError::Archive(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_converts_to_io_variant() {
        let err: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        match err {
            AppError::Io(msg) => assert!(msg.contains("gone")),
            other => panic!("Expected AppError::Io, got: {:?}", other),
        }
    }

    #[test]
    fn test_validation_message_is_shown_verbatim() {
        let err = AppError::Validation("File is empty".into());
        assert_eq!(err.to_string(), "File is empty");
    }

    #[test]
    fn test_failure_kind_mapping() {
        assert_eq!(
            AppError::Network("reset".into()).failure_kind(),
            FailureKind::Network
        );
        assert_eq!(
            AppError::Api("status=413".into()).failure_kind(),
            FailureKind::RemoteRejected
        );
        assert_eq!(
            AppError::Timeout("60s".into()).failure_kind(),
            FailureKind::Timeout
        );
        assert_eq!(
            AppError::Config("none".into()).failure_kind(),
            FailureKind::Configuration
        );
    }

    #[test]
    fn test_zip_error_converts_to_archive_variant() {
        let err: AppError = zip::result::ZipError::FileNotFound.into();
        assert!(matches!(err, AppError::Archive(_)));
    }
}
