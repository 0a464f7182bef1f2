use std::path::Path;

use serde_json::Value;

use crate::error::AppError;
use crate::models::settings::AppSettings;
use crate::storage::settings;

pub fn get_settings(data_dir: &Path) -> crate::error::Result<AppSettings> {
    settings::get_settings(data_dir)
}

pub fn save_settings(data_dir: &Path, settings_data: &AppSettings) -> crate::error::Result<()> {
    settings::save_settings(data_dir, settings_data)
}

/// Update one setting by its camelCase key and persist the result.
///
/// `raw` is read as JSON when it parses (`true`, `10`, `null`), otherwise as
/// a plain string.
pub fn set_setting(data_dir: &Path, key: &str, raw: &str) -> crate::error::Result<AppSettings> {
    let current = settings::get_settings(data_dir)?;
    let mut value = serde_json::to_value(&current)?;
    let fields = value
        .as_object_mut()
        .ok_or_else(|| AppError::Internal("Settings are not a JSON object".into()))?;
    if !fields.contains_key(key) {
        return Err(AppError::Validation(format!("Unknown setting: {}", key)));
    }

    let parsed = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    fields.insert(key.to_string(), parsed);

    let updated: AppSettings = serde_json::from_value(value)
        .map_err(|e| AppError::Validation(format!("Invalid value for {}: {}", key, e)))?;
    settings::save_settings(data_dir, &updated)?;
    log::info!("Setting updated: key={}", key);
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_string_setting() {
        let dir = tempfile::tempdir().unwrap();
        let updated = set_setting(dir.path(), "defaultService", "file.io").unwrap();
        assert_eq!(updated.default_service, "file.io");
        assert_eq!(get_settings(dir.path()).unwrap().default_service, "file.io");
    }

    #[test]
    fn test_set_typed_settings() {
        let dir = tempfile::tempdir().unwrap();
        set_setting(dir.path(), "keepUploadHistory", "false").unwrap();
        let updated = set_setting(dir.path(), "maxDownloads", "5").unwrap();
        assert!(!updated.keep_upload_history);
        assert_eq!(updated.max_downloads, Some(5));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            set_setting(dir.path(), "colour", "blue"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            set_setting(dir.path(), "maxHistoryItems", "lots"),
            Err(AppError::Validation(_))
        ));
        assert_eq!(get_settings(dir.path()).unwrap(), AppSettings::default());
    }
}
