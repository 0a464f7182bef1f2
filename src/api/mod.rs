//! Upload service abstraction layer.
//!
//! `UploadHandler` is the sole interface for HTTP interactions with upload
//! services. Every request to a remote host is built inside `api/`; the
//! `services` and `commands` layers only see handlers through this trait and
//! never construct HTTP requests themselves.
//!
//! Handlers never return `Err`: transport errors, remote rejections and
//! timeouts are all folded into `UploadResult::Failure` so the orchestrator
//! can move on to the next service.

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::file::FilePayload;
use crate::models::upload::{UploadOptions, UploadResult};

/// An upload-capable remote storage backend.
///
/// Handlers are built once at startup and are immutable afterwards, so they
/// can be shared across tasks behind an `Arc`.
#[async_trait]
pub trait UploadHandler: Send + Sync {
    /// Unique registry key.
    fn name(&self) -> &str;

    /// Largest payload the service accepts, in bytes.
    fn max_file_size(&self) -> u64;

    /// File extensions the service accepts; `*` accepts anything.
    fn supported_formats(&self) -> &[&str] {
        &["*"]
    }

    /// Upload `file` and return a download link or a failure.
    ///
    /// Progress is reported through `options.on_progress` as the request
    /// body is streamed.
    async fn upload(&self, file: &FilePayload, options: &UploadOptions) -> UploadResult;
}

/// Check that a link returned by a service is an absolute http(s) URL.
pub fn parse_download_link(raw: &str) -> crate::error::Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::Api("Service returned an empty link".into()));
    }
    let url = reqwest::Url::parse(trimmed)
        .map_err(|e| AppError::Api(format!("Service returned an invalid link '{}': {}", trimmed, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url.to_string()),
        other => Err(AppError::Api(format!(
            "Service returned a link with unsupported scheme '{}'",
            other
        ))),
    }
}

pub mod file_io;
pub mod storage_proxy;
pub mod transport;
pub mod zero_x_zero;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_download_link_accepts_https() {
        assert_eq!(
            parse_download_link("  https://0x0.st/abc.txt\n").unwrap(),
            "https://0x0.st/abc.txt"
        );
    }

    #[test]
    fn test_parse_download_link_rejects_relative() {
        let err = parse_download_link("/abc.txt").unwrap_err();
        assert!(matches!(err, AppError::Api(_)));
    }

    #[test]
    fn test_parse_download_link_rejects_empty() {
        let err = parse_download_link("   ").unwrap_err();
        assert!(err.to_string().contains("empty link"), "got: {}", err);
    }

    #[test]
    fn test_parse_download_link_rejects_other_schemes() {
        let err = parse_download_link("ftp://example.com/a").unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"), "got: {}", err);
    }

    #[test]
    fn test_trait_is_object_safe() {
        fn _assert(_: &dyn UploadHandler) {}
    }
}
