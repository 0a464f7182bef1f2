use std::path::Path;

use super::JsonStore;
use crate::models::settings::AppSettings;

const STORE_FILE: &str = "settings.json";
const SETTINGS_KEY: &str = "settings";

/// Read settings from `data_dir`. Returns defaults if none saved.
pub fn get_settings(data_dir: &Path) -> crate::error::Result<AppSettings> {
    let store = JsonStore::open(data_dir, STORE_FILE)?;
    let settings = store
        .get(SETTINGS_KEY)
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();
    Ok(settings)
}

/// Save settings. Persists to disk immediately.
pub fn save_settings(data_dir: &Path, settings: &AppSettings) -> crate::error::Result<()> {
    let mut store = JsonStore::open(data_dir, STORE_FILE)?;
    store.set(SETTINGS_KEY, serde_json::to_value(settings)?);
    store.save()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_settings_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let settings = get_settings(dir.path()).unwrap();
        assert_eq!(settings, AppSettings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let original = AppSettings {
            default_service: "file.io".into(),
            max_history_items: 10,
            ..AppSettings::default()
        };
        save_settings(dir.path(), &original).unwrap();
        assert_eq!(get_settings(dir.path()).unwrap(), original);
    }

    #[test]
    fn test_settings_file_uses_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        save_settings(dir.path(), &AppSettings::default()).unwrap();
        let text = std::fs::read_to_string(dir.path().join("settings.json")).unwrap();
        assert!(text.contains("\"defaultService\""), "got: {}", text);
    }
}
