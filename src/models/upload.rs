//! Upload request/response models.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

/// Byte-level progress of one upload attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadProgress {
    pub loaded: u64,
    pub total: u64,
    /// Rounded percentage in `0..=100`.
    pub percentage: u8,
}

impl UploadProgress {
    pub fn from_bytes(loaded: u64, total: u64) -> Self {
        let percentage = if total == 0 {
            100
        } else {
            ((loaded.min(total) as f64 * 100.0) / total as f64).round() as u8
        };
        Self {
            loaded,
            total,
            percentage,
        }
    }

    pub fn percent(percentage: u8) -> Self {
        Self {
            loaded: 0,
            total: 0,
            percentage: percentage.min(100),
        }
    }
}

pub type ProgressCallback = Arc<dyn Fn(UploadProgress) + Send + Sync>;

/// Per-call options passed to a handler.
#[derive(Clone, Default)]
pub struct UploadOptions {
    /// Expiration hint in the service's own syntax (e.g. `1w`).
    pub expiration: Option<String>,
    pub max_downloads: Option<u32>,
    pub on_progress: Option<ProgressCallback>,
}

impl UploadOptions {
    pub fn report(&self, progress: UploadProgress) {
        if let Some(cb) = &self.on_progress {
            cb(progress);
        }
    }
}

impl fmt::Debug for UploadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadOptions")
            .field("expiration", &self.expiration)
            .field("max_downloads", &self.max_downloads)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// A usable download link returned by a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadLink {
    pub url: String,
    /// Storage key assigned by the service, if it reports one.
    pub key: Option<String>,
    /// Expiry timestamp or hint, as reported by the service.
    pub expiry: Option<String>,
}

impl UploadLink {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key: None,
            expiry: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    SizeExceeded,
    EmptyFile,
    Validation,
    Network,
    RemoteRejected,
    Timeout,
    Configuration,
    Busy,
    Internal,
}

impl FailureKind {
    /// Client-side failures are decided before any network call and are not
    /// worth retrying on another service.
    pub fn is_preflight(self) -> bool {
        matches!(
            self,
            FailureKind::SizeExceeded
                | FailureKind::EmptyFile
                | FailureKind::Validation
                | FailureKind::Configuration
                | FailureKind::Busy
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl UploadFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<crate::error::AppError> for UploadFailure {
    fn from(err: crate::error::AppError) -> Self {
        let kind = err.failure_kind();
        let message = match err {
            crate::error::AppError::Api(msg)
            | crate::error::AppError::Validation(msg)
            | crate::error::AppError::Network(msg) => msg,
            other => other.to_string(),
        };
        Self { kind, message }
    }
}

/// Outcome of one upload attempt: either a link or an error, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum UploadResult {
    Success(UploadLink),
    Failure(UploadFailure),
}

impl UploadResult {
    pub fn success(link: UploadLink) -> Self {
        UploadResult::Success(link)
    }

    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        UploadResult::Failure(UploadFailure::new(kind, message))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UploadResult::Success(_))
    }

    pub fn link(&self) -> Option<&UploadLink> {
        match self {
            UploadResult::Success(link) => Some(link),
            UploadResult::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            UploadResult::Success(_) => None,
            UploadResult::Failure(f) => Some(&f.message),
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            UploadResult::Success(_) => None,
            UploadResult::Failure(f) => Some(f.kind),
        }
    }
}

impl From<crate::error::Result<UploadLink>> for UploadResult {
    fn from(res: crate::error::Result<UploadLink>) -> Self {
        match res {
            Ok(link) => UploadResult::Success(link),
            Err(err) => UploadResult::Failure(err.into()),
        }
    }
}

/// What the user chose for this upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadSettings {
    pub service: String,
    pub expiration: Option<String>,
    pub max_downloads: Option<u32>,
}

/// One handler invocation made by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub service: String,
    pub error: Option<String>,
}

/// Final answer of the orchestrator for one user action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    pub result: UploadResult,
    /// Service that produced `result`; empty when no handler was invoked.
    pub service: String,
    pub attempts: Vec<AttemptRecord>,
    pub warnings: Vec<String>,
}

impl UploadOutcome {
    pub fn rejected(failure: UploadFailure, warnings: Vec<String>) -> Self {
        Self {
            result: UploadResult::Failure(failure),
            service: String::new(),
            attempts: Vec::new(),
            warnings,
        }
    }

    /// Errors of every failed attempt, in the order they were tried.
    pub fn attempt_errors(&self) -> Vec<String> {
        self.attempts
            .iter()
            .filter_map(|a| a.error.as_ref().map(|e| format!("{}: {}", a.service, e)))
            .collect()
    }
}
