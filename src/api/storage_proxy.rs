//! Handler for the serverless storage proxy.
//!
//! The proxy accepts the file as a base64 JSON payload, stores it in the
//! object-storage bucket and answers with a time-limited signed download URL.
//! It also exposes a health probe reporting bucket connectivity.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::transport::{build_client, progress_body, response_text};
use super::{parse_download_link, UploadHandler};
use crate::error::AppError;
use crate::models::file::FilePayload;
use crate::models::upload::{UploadLink, UploadOptions, UploadResult};

pub const SERVICE_NAME: &str = "cloud";
/// The proxy rejects decoded payloads above 100 MiB.
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadRequest<'a> {
    file_name: &'a str,
    file_data: String,
    file_type: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UploadResponse {
    #[serde(default)]
    pub success: bool,
    pub link: Option<String>,
    /// Storage key assigned by the proxy.
    pub file_name: Option<String>,
    pub expires_in: Option<i64>,
    pub error: Option<String>,
}

/// Bucket status section of the health report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BucketStatus {
    pub configured: bool,
    pub connected: bool,
    pub bucket: Option<String>,
    pub bucket_exists: Option<bool>,
    pub error: Option<String>,
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HealthStatus {
    pub healthy: bool,
    pub service: Option<String>,
    pub version: Option<String>,
    pub timestamp: Option<String>,
    pub error: Option<String>,
    #[serde(rename = "supabase")]
    pub storage: Option<BucketStatus>,
}

pub struct StorageProxyHandler {
    base_url: String,
    client: reqwest::Client,
}

impl StorageProxyHandler {
    pub fn new(base_url: &str) -> crate::error::Result<Self> {
        Self::with_timeout(base_url, UPLOAD_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> crate::error::Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(AppError::Config("Storage proxy URL is not configured".into()));
        }
        Ok(Self {
            base_url,
            client: build_client(timeout)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn encode_payload(file: &FilePayload) -> crate::error::Result<Vec<u8>> {
        let request = UploadRequest {
            file_name: &file.name,
            file_data: base64::engine::general_purpose::STANDARD.encode(&file.data),
            file_type: file.mime(),
        };
        Ok(serde_json::to_vec(&request)?)
    }

    /// Turn a proxy response into a link, given its HTTP status and body.
    pub(crate) fn parse_upload_response(
        status: u16,
        body: &str,
        now: chrono::DateTime<chrono::Utc>,
    ) -> crate::error::Result<UploadLink> {
        let parsed: Option<UploadResponse> = serde_json::from_str(body).ok();
        if !(200..300).contains(&status) {
            let reason = parsed
                .and_then(|r| r.error)
                .unwrap_or_else(|| format!("Upload failed with status {}", status));
            return Err(AppError::Api(reason));
        }
        let resp = parsed.ok_or_else(|| AppError::Api("Invalid response from server".into()))?;
        if !resp.success {
            return Err(AppError::Api(
                resp.error.unwrap_or_else(|| "Upload failed".into()),
            ));
        }
        let url = parse_download_link(resp.link.as_deref().unwrap_or_default())?;
        let expiry = resp
            .expires_in
            .map(|secs| (now + chrono::Duration::seconds(secs)).to_rfc3339());
        Ok(UploadLink {
            url,
            key: resp.file_name,
            expiry,
        })
    }

    async fn try_upload(
        &self,
        file: &FilePayload,
        options: &UploadOptions,
    ) -> crate::error::Result<UploadLink> {
        let payload = Self::encode_payload(file)?;
        let url = format!("{}/api/upload", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(progress_body(payload.into(), options))
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = response_text(resp).await?;
        Self::parse_upload_response(status, &body, chrono::Utc::now())
    }

    /// Probe `/api/health`. A 503 still carries a JSON report, so the body is
    /// parsed regardless of status.
    pub async fn health(&self) -> crate::error::Result<HealthStatus> {
        let url = format!("{}/api/health", self.base_url);
        let resp = self.client.get(&url).timeout(HEALTH_TIMEOUT).send().await?;
        let status = resp.status().as_u16();
        let body = response_text(resp).await?;
        serde_json::from_str(&body).map_err(|e| {
            AppError::Api(format!(
                "Health check returned status {} with unreadable body: {}",
                status, e
            ))
        })
    }
}

#[async_trait]
impl UploadHandler for StorageProxyHandler {
    fn name(&self) -> &str {
        SERVICE_NAME
    }

    fn max_file_size(&self) -> u64 {
        MAX_FILE_SIZE
    }

    async fn upload(&self, file: &FilePayload, options: &UploadOptions) -> UploadResult {
        let result = self.try_upload(file, options).await;
        if let Err(e) = &result {
            log::warn!("Storage proxy upload failed: file={}, error={}", file.name, e);
        }
        result.into()
    }
}
