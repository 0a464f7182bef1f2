//! Resolution of user-supplied paths into file entries.
//!
//! Directories are recursively traversed. Hidden files and known system files
//! are filtered out. Each entry records a path relative to the dropped
//! directory's parent, so `photos/2024/a.jpg` keeps the folder name.

use crate::error::AppError;
use crate::models::file::FileEntry;
use std::path::Path;

/// System file names that should be filtered out regardless of location.
const SYSTEM_FILES: &[&str] = &[".DS_Store", "Thumbs.db", "desktop.ini"];

/// Directory names that should be skipped during recursive traversal.
const SYSTEM_DIRS: &[&str] = &["__MACOSX"];

/// Returns true if the given file/directory name should be excluded.
fn is_hidden_or_system(name: &str) -> bool {
    name.starts_with('.') || SYSTEM_FILES.contains(&name) || SYSTEM_DIRS.contains(&name)
}

/// What the user picked: one file, or a folder to be archived first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Single(FileEntry),
    Folder {
        name: String,
        entries: Vec<FileEntry>,
    },
}

impl Selection {
    /// More than one entry, or any nested relative path, makes a folder.
    /// The folder name is the first segment of the first entry's path.
    pub fn classify(mut entries: Vec<FileEntry>) -> crate::error::Result<Self> {
        let is_folder = entries.len() > 1 || entries.iter().any(|e| e.relative_path.contains('/'));
        if !is_folder {
            return entries
                .pop()
                .map(Selection::Single)
                .ok_or_else(|| AppError::Validation("No files selected".into()));
        }
        let name = entries
            .first()
            .and_then(|e| e.relative_path.split('/').next())
            .unwrap_or_default()
            .to_string();
        Ok(Selection::Folder { name, entries })
    }

    pub fn total_size(&self) -> u64 {
        match self {
            Selection::Single(entry) => entry.file_size,
            Selection::Folder { entries, .. } => entries.iter().map(|e| e.file_size).sum(),
        }
    }
}

/// Adds a single file entry without filtering (used for user-provided top-level paths).
fn add_file_entry(path: &Path, relative: String, entries: &mut Vec<FileEntry>) -> Result<(), AppError> {
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n,
        None => return Ok(()),
    };
    let metadata = std::fs::metadata(path)?;
    entries.push(FileEntry {
        file_name: name.to_string(),
        file_path: path.to_string_lossy().to_string(),
        relative_path: relative,
        file_size: metadata.len(),
    });
    Ok(())
}

/// Recursively collects file entries from a directory's contents.
///
/// Hidden and system files/directories are filtered out during traversal.
/// This is only applied to children discovered during recursion, not to
/// user-provided top-level paths. Children are visited in name order.
fn collect_dir_contents(dir: &Path, prefix: &str, entries: &mut Vec<FileEntry>) -> Result<(), AppError> {
    let mut children = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    children.sort();

    for child in children {
        let name = match child.file_name().and_then(|n| n.to_str()) {
            Some(n) => n,
            None => continue,
        };
        if is_hidden_or_system(name) {
            continue;
        }
        let relative = format!("{}/{}", prefix, name);
        if child.is_file() {
            add_file_entry(&child, relative, entries)?;
        } else if child.is_dir() {
            collect_dir_contents(&child, &relative, entries)?;
        }
    }
    Ok(())
}

/// Resolves file/directory paths into a flat list of file entries.
///
/// - Regular files are returned directly.
/// - Directories are recursively traversed.
/// - Hidden files (names starting with `.`) and system files
///   (`.DS_Store`, `Thumbs.db`, `desktop.ini`, `__MACOSX`) are filtered out.
/// - Returns an error if any path does not exist.
pub async fn resolve_dropped_paths(paths: Vec<String>) -> crate::error::Result<Vec<FileEntry>> {
    tokio::task::spawn_blocking(move || resolve_paths_inner(paths))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
}

fn resolve_paths_inner(paths: Vec<String>) -> crate::error::Result<Vec<FileEntry>> {
    let mut entries = Vec::new();
    for path_str in &paths {
        let path = Path::new(path_str);
        if !path.exists() {
            return Err(AppError::Io(format!("Path does not exist: {}", path_str)));
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        if path.is_file() {
            add_file_entry(path, name, &mut entries)?;
        } else if path.is_dir() {
            let prefix = if name.is_empty() { "folder".to_string() } else { name };
            collect_dir_contents(path, &prefix, &mut entries)?;
        }
    }
    Ok(entries)
}
