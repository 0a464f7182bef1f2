//! Handler for 0x0.st: anonymous multipart upload, the response body is the
//! bare download URL.

use std::time::Duration;

use async_trait::async_trait;

use super::transport::{build_client, progress_body, response_text};
use super::{parse_download_link, UploadHandler};
use crate::error::AppError;
use crate::models::file::FilePayload;
use crate::models::upload::{UploadLink, UploadOptions, UploadResult};

pub const SERVICE_NAME: &str = "0x0.st";
pub const MAX_FILE_SIZE: u64 = 512 * 1024 * 1024;
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

pub struct ZeroXZeroHandler {
    endpoint: String,
    client: reqwest::Client,
}

impl ZeroXZeroHandler {
    pub fn new(endpoint: &str) -> crate::error::Result<Self> {
        Self::with_timeout(endpoint, UPLOAD_TIMEOUT)
    }

    pub fn with_timeout(endpoint: &str, timeout: Duration) -> crate::error::Result<Self> {
        Ok(Self {
            endpoint: endpoint.to_string(),
            client: build_client(timeout)?,
        })
    }

    pub(crate) fn parse_response(status: u16, body: &str) -> crate::error::Result<UploadLink> {
        if status != 200 {
            return Err(AppError::Api(format!("Upload failed with status {}", status)));
        }
        Ok(UploadLink::new(parse_download_link(body)?))
    }

    async fn try_upload(
        &self,
        file: &FilePayload,
        options: &UploadOptions,
    ) -> crate::error::Result<UploadLink> {
        let part = reqwest::multipart::Part::stream_with_length(
            progress_body(file.data.clone(), options),
            file.size(),
        )
        .file_name(file.name.clone())
        .mime_str(file.mime())
        .map_err(|e| AppError::Internal(format!("MIME parse error: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let resp = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = response_text(resp).await?;
        Self::parse_response(status, &body)
    }
}

#[async_trait]
impl UploadHandler for ZeroXZeroHandler {
    fn name(&self) -> &str {
        SERVICE_NAME
    }

    fn max_file_size(&self) -> u64 {
        MAX_FILE_SIZE
    }

    async fn upload(&self, file: &FilePayload, options: &UploadOptions) -> UploadResult {
        let result = self.try_upload(file, options).await;
        if let Err(e) = &result {
            log::warn!("0x0.st upload failed: file={}, error={}", file.name, e);
        }
        result.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_url_body() {
        let link = ZeroXZeroHandler::parse_response(200, "https://0x0.st/H3xZ.txt\n").unwrap();
        assert_eq!(link.url, "https://0x0.st/H3xZ.txt");
        assert!(link.key.is_none());
    }

    #[test]
    fn test_parse_non_200_status() {
        let err = ZeroXZeroHandler::parse_response(451, "blocked").unwrap_err();
        assert_eq!(err.to_string(), "API error: Upload failed with status 451");
    }

    #[test]
    fn test_parse_200_with_html_body_is_rejected() {
        assert!(ZeroXZeroHandler::parse_response(200, "<html>oops</html>").is_err());
    }

    #[test]
    fn test_handler_identity() {
        let handler = ZeroXZeroHandler::new("https://0x0.st").unwrap();
        assert_eq!(handler.name(), "0x0.st");
        assert_eq!(handler.max_file_size(), 512 * 1024 * 1024);
        assert_eq!(handler.supported_formats(), &["*"]);
    }
}
