//! Client-side pre-flight checks run before any network call.
//!
//! These checks are advisory: the remote service has the final word, and a
//! rejection there still comes back as an ordinary failure result.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::file::FilePayload;
use crate::models::upload::{FailureKind, UploadFailure};

/// Files above this size get a "may take longer" warning.
pub const LARGE_FILE_WARNING_BYTES: u64 = 100 * 1024 * 1024;
pub const MAX_FILE_NAME_LEN: usize = 255;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: Vec<(FailureKind, String)>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// All blocking errors folded into one failure. The kind is the first
    /// error's; messages are joined with `; `.
    pub fn failure(&self) -> Option<UploadFailure> {
        let (kind, _) = self.errors.first()?;
        let message = self
            .errors
            .iter()
            .map(|(_, m)| m.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        Some(UploadFailure::new(*kind, message))
    }
}

fn has_special_chars(name: &str) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[<>:"/\\|?*]"#).ok())
        .as_ref()
        .is_some_and(|re| re.is_match(name))
}

pub fn validate_file(file: &FilePayload, max_size: u64) -> ValidationReport {
    let mut report = ValidationReport::default();
    let size = file.size();

    if size == 0 {
        report
            .errors
            .push((FailureKind::EmptyFile, "File is empty".to_string()));
    } else if size > max_size {
        report.errors.push((
            FailureKind::SizeExceeded,
            format!(
                "File size ({}) exceeds the maximum limit of {}",
                format_file_size(size),
                format_file_size(max_size)
            ),
        ));
    }

    if size > LARGE_FILE_WARNING_BYTES {
        report
            .warnings
            .push("Large files may take longer to upload".to_string());
    }
    if file.name.chars().count() > MAX_FILE_NAME_LEN {
        report
            .warnings
            .push("File name is very long and may cause issues".to_string());
    }
    if has_special_chars(&file.name) {
        report
            .warnings
            .push("File name contains special characters that may cause issues".to_string());
    }

    report
}

/// Human-readable size with binary units, e.g. `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}
