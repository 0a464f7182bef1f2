//! Handler for file.io: multipart upload with optional expiry and download
//! limit, JSON response carrying the link.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::transport::{build_client, progress_body, response_text};
use super::{parse_download_link, UploadHandler};
use crate::error::AppError;
use crate::models::file::FilePayload;
use crate::models::upload::{UploadLink, UploadOptions, UploadResult};

pub const SERVICE_NAME: &str = "file.io";
pub const MAX_FILE_SIZE: u64 = 2 * 1024 * 1024 * 1024;
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Deserialize)]
struct FileIoResponse {
    #[serde(default)]
    success: bool,
    link: Option<String>,
    key: Option<String>,
    expiry: Option<String>,
    message: Option<String>,
}

pub struct FileIoHandler {
    endpoint: String,
    client: reqwest::Client,
}

impl FileIoHandler {
    pub fn new(endpoint: &str) -> crate::error::Result<Self> {
        Self::with_timeout(endpoint, UPLOAD_TIMEOUT)
    }

    pub fn with_timeout(endpoint: &str, timeout: Duration) -> crate::error::Result<Self> {
        Ok(Self {
            endpoint: endpoint.to_string(),
            client: build_client(timeout)?,
        })
    }

    /// file.io reports failures in the JSON body, sometimes with a 2xx status.
    pub(crate) fn parse_response(body: &str) -> crate::error::Result<UploadLink> {
        let resp: FileIoResponse = serde_json::from_str(body)
            .map_err(|_| AppError::Api("Invalid response from server".into()))?;
        if !resp.success {
            return Err(AppError::Api(
                resp.message.unwrap_or_else(|| "Upload failed".into()),
            ));
        }
        Ok(UploadLink {
            url: parse_download_link(resp.link.as_deref().unwrap_or_default())?,
            key: resp.key,
            expiry: resp.expiry,
        })
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

        let mut form = reqwest::multipart::Form::new().part("file", part);
        if let Some(expires) = &options.expiration {
            form = form.text("expires", expires.clone());
        }
        if let Some(max) = options.max_downloads {
            form = form.text("maxDownloads", max.to_string());
        }

        let resp = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;
        let body = response_text(resp).await?;
        Self::parse_response(&body)
    }
}

#[async_trait]
impl UploadHandler for FileIoHandler {
    fn name(&self) -> &str {
        SERVICE_NAME
    }

    fn max_file_size(&self) -> u64 {
        MAX_FILE_SIZE
    }

    async fn upload(&self, file: &FilePayload, options: &UploadOptions) -> UploadResult {
        let result = self.try_upload(file, options).await;
        if let Err(e) = &result {
            log::warn!("file.io upload failed: file={}, error={}", file.name, e);
        }
        result.into()
    }
}
