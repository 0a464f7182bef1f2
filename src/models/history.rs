use serde::{Deserialize, Serialize};

/// A single upload history record persisted to local storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    /// Unique identifier (UUID v4 hex, 32 chars).
    pub id: String,
    pub file_name: String,
    pub file_size: u64,
    pub download_url: String,
    /// Service that produced the link.
    pub service_name: String,
    /// RFC 3339 upload timestamp.
    pub uploaded_at: String,
    /// RFC 3339 expiry, when the service reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

impl HistoryRecord {
    pub fn new(
        file_name: impl Into<String>,
        file_size: u64,
        download_url: impl Into<String>,
        service_name: impl Into<String>,
        expires_at: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            file_name: file_name.into(),
            file_size,
            download_url: download_url.into(),
            service_name: service_name.into(),
            uploaded_at: chrono::Utc::now().to_rfc3339(),
            expires_at,
        }
    }
}
