//! File models: resolved drop entries and the in-memory payload handed to
//! upload handlers.

use bytes::Bytes;

/// A resolved file on disk.
///
/// `relative_path` is rooted at the dropped directory's name for folder
/// drops (`photos/2024/a.jpg`) and equals `file_name` for single files.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub file_name: String,
    pub file_path: String,
    pub relative_path: String,
    pub file_size: u64,
}

/// An opaque binary blob with a name, ready to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePayload {
    pub name: String,
    pub data: Bytes,
    pub content_type: Option<String>,
}

impl FilePayload {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// MIME type sent to services; falls back to `application/octet-stream`.
    pub fn mime(&self) -> &str {
        self.content_type
            .as_deref()
            .unwrap_or("application/octet-stream")
    }
}
