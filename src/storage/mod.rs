//! Local persistence layer.
//!
//! Settings and upload history live in small JSON key-value files inside the
//! data directory. `save` writes a temporary sibling and renames it over the
//! file.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::AppError;

pub mod history;
pub mod settings;

/// A JSON object persisted to one file.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl JsonStore {
    /// Open `file_name` inside `dir`. A missing file is an empty store; a
    /// corrupt one is logged and treated as empty.
    pub fn open(dir: &Path, file_name: &str) -> crate::error::Result<Self> {
        let path = dir.join(file_name);
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Map<String, Value>>(&text) {
                Ok(map) => map,
                Err(e) => {
                    log::warn!("Ignoring unreadable store: path={}, error={}", path.display(), e);
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }

    pub fn save(&self) -> crate::error::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Storage(format!("Failed to create {}: {}", parent.display(), e)))?;
        }
        let text = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, text)
            .map_err(|e| AppError::Storage(format!("Failed to write {}: {}", tmp.display(), e)))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| AppError::Storage(format!("Failed to replace {}: {}", self.path.display(), e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path(), "none.json").unwrap();
        assert!(store.get("anything").is_none());
    }

    #[test]
    fn test_set_save_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonStore::open(dir.path(), "s.json").unwrap();
        store.set("k", serde_json::json!({"a": 1}));
        store.save().unwrap();

        let reopened = JsonStore::open(dir.path(), "s.json").unwrap();
        assert_eq!(reopened.get("k").unwrap()["a"], 1);
        assert!(!dir.path().join("s.json.tmp").exists());
    }

    #[test]
    fn test_save_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let mut store = JsonStore::open(&nested, "s.json").unwrap();
        store.set("k", Value::Bool(true));
        store.save().unwrap();
        assert!(nested.join("s.json").exists());
    }

    #[test]
    fn test_corrupt_file_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("s.json"), "{not json").unwrap();
        let store = JsonStore::open(dir.path(), "s.json").unwrap();
        assert!(store.get("k").is_none());
    }
}
