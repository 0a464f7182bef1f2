use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_URL: &str = "https://easyshare-vnbw.vercel.app";
pub const DEFAULT_FILEIO_URL: &str = "https://file.io";
pub const DEFAULT_ZEROXZERO_URL: &str = "https://0x0.st";

/// User settings persisted to settings.json.
///
/// Unknown or missing keys fall back to their defaults so older files keep
/// loading after new settings are added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    /// Primary upload service name.
    pub default_service: String,
    /// Expiration hint forwarded to services that accept one.
    pub default_expiration: String,
    pub max_downloads: Option<u32>,
    pub keep_upload_history: bool,
    pub max_history_items: usize,
    /// Base URL of the storage proxy (`/api/upload`, `/api/health`).
    pub api_base_url: String,
    pub fileio_url: String,
    pub zeroxzero_url: String,
    /// Per-attempt upload timeout in seconds.
    pub upload_timeout_secs: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_service: crate::api::storage_proxy::SERVICE_NAME.to_string(),
            default_expiration: "1w".to_string(),
            max_downloads: None,
            keep_upload_history: true,
            max_history_items: 50,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            fileio_url: DEFAULT_FILEIO_URL.to_string(),
            zeroxzero_url: DEFAULT_ZEROXZERO_URL.to_string(),
            upload_timeout_secs: 300,
        }
    }
}

impl AppSettings {
    pub fn upload_settings(&self) -> crate::models::upload::UploadSettings {
        crate::models::upload::UploadSettings {
            service: self.default_service.clone(),
            expiration: Some(self.default_expiration.clone()).filter(|e| !e.is_empty()),
            max_downloads: self.max_downloads,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_camel_case_keys() {
        let settings = AppSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains("defaultService"), "got: {}", json);
        assert!(json.contains("maxHistoryItems"), "got: {}", json);
        assert!(!json.contains("default_service"), "got: {}", json);
    }

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let settings: AppSettings =
            serde_json::from_str(r#"{"defaultService": "0x0.st"}"#).unwrap();
        assert_eq!(settings.default_service, "0x0.st");
        assert_eq!(settings.max_history_items, 50);
        assert_eq!(settings.upload_timeout_secs, 300);
    }

    #[test]
    fn test_default_service_is_cloud() {
        assert_eq!(AppSettings::default().default_service, "cloud");
    }

    #[test]
    fn test_empty_expiration_is_not_forwarded() {
        let settings = AppSettings {
            default_expiration: String::new(),
            ..AppSettings::default()
        };
        assert!(settings.upload_settings().expiration.is_none());
        assert_eq!(
            AppSettings::default().upload_settings().expiration.as_deref(),
            Some("1w")
        );
    }
}
