//! Share command: resolve paths, archive folders, upload, record history.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::api::file_io::FileIoHandler;
use crate::api::storage_proxy::StorageProxyHandler;
use crate::api::zero_x_zero::ZeroXZeroHandler;
use crate::commands::files::{self, Selection};
use crate::error::AppError;
use crate::models::file::{FileEntry, FilePayload};
use crate::models::history::HistoryRecord;
use crate::models::settings::AppSettings;
use crate::models::upload::{FailureKind, ProgressCallback, UploadOutcome, UploadSettings};
use crate::services::archiver::{ArchiveInput, ArchiveProgressCallback, FolderArchiver, ZipCodec};
use crate::services::fallback::OrchestratorConfig;
use crate::services::orchestrator::UploadOrchestrator;
use crate::services::registry::ServiceRegistry;
use crate::storage::history;

/// Session state shared by every command of one run.
pub struct UploadState {
    data_dir: PathBuf,
    settings: AppSettings,
    orchestrator: UploadOrchestrator,
    archiver: FolderArchiver,
}

impl UploadState {
    pub fn new(data_dir: impl Into<PathBuf>, settings: AppSettings) -> crate::error::Result<Self> {
        let registry = build_registry(&settings)?;
        Ok(Self::with_registry(data_dir, settings, registry))
    }

    pub fn with_registry(
        data_dir: impl Into<PathBuf>,
        settings: AppSettings,
        registry: ServiceRegistry,
    ) -> Self {
        let config = OrchestratorConfig::default()
            .with_attempt_timeout(Duration::from_secs(settings.upload_timeout_secs.max(1)));
        Self {
            data_dir: data_dir.into(),
            orchestrator: UploadOrchestrator::new(Arc::new(registry), config),
            archiver: FolderArchiver::new(Arc::new(ZipCodec::default())),
            settings,
        }
    }

    pub fn with_archiver(mut self, archiver: FolderArchiver) -> Self {
        self.archiver = archiver;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn registry(&self) -> &ServiceRegistry {
        self.orchestrator.registry()
    }
}

/// Register the built-in services from settings. The storage proxy is left
/// out when no base URL is configured.
pub fn build_registry(settings: &AppSettings) -> crate::error::Result<ServiceRegistry> {
    let mut registry = ServiceRegistry::new();
    match StorageProxyHandler::new(&settings.api_base_url) {
        Ok(handler) => registry.register(Arc::new(handler))?,
        Err(AppError::Config(msg)) => log::warn!("Skipping storage proxy: {}", msg),
        Err(e) => return Err(e),
    }
    registry.register(Arc::new(ZeroXZeroHandler::new(&settings.zeroxzero_url)?))?;
    registry.register(Arc::new(FileIoHandler::new(&settings.fileio_url)?))?;
    log::debug!("Upload services registered: {:?}", registry);
    Ok(registry)
}

/// Per-invocation overrides of the saved settings.
#[derive(Debug, Clone, Default)]
pub struct ShareOverrides {
    pub service: Option<String>,
    pub expiration: Option<String>,
    pub max_downloads: Option<u32>,
}

impl ShareOverrides {
    fn apply(self, mut settings: UploadSettings) -> UploadSettings {
        if let Some(service) = self.service {
            settings.service = service;
        }
        if let Some(expiration) = self.expiration {
            settings.expiration = Some(expiration).filter(|e| !e.is_empty());
        }
        if self.max_downloads.is_some() {
            settings.max_downloads = self.max_downloads;
        }
        settings
    }
}

#[derive(Clone, Default)]
pub struct ShareCallbacks {
    pub on_archive: Option<ArchiveProgressCallback>,
    pub on_upload: Option<ProgressCallback>,
}

/// Everything the caller needs to display the result of a share.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareReport {
    pub file_name: String,
    pub file_size: u64,
    pub archived: bool,
    /// Why a folder was uploaded as its first file only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_error: Option<String>,
    pub outcome: UploadOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_id: Option<String>,
    pub suggestions: Vec<String>,
}

/// Resolve `paths`, archive folders, upload the result and record it in the
/// history. Upload failures are part of the report; `Err` is reserved for
/// problems reading the selection.
pub async fn share(
    state: &UploadState,
    paths: Vec<String>,
    overrides: ShareOverrides,
    callbacks: ShareCallbacks,
) -> crate::error::Result<ShareReport> {
    let entries = files::resolve_dropped_paths(paths).await?;
    let selection = Selection::classify(entries)?;
    let selection_size = selection.total_size();

    let (payload, archived, archive_error) = match selection {
        Selection::Single(entry) => (read_payload(&entry).await?, false, None),
        Selection::Folder { name, entries } => {
            let archived =
                archive_folder(state, &name, &entries, selection_size, callbacks.on_archive.clone())
                    .await;
            match archived {
                Ok(payload) => (payload, true, None),
                Err(e) => {
                    log::warn!(
                        "Folder compression failed, uploading first file only: folder={}, error={}",
                        name,
                        e
                    );
                    let first = entries
                        .first()
                        .ok_or_else(|| AppError::Validation("No files selected".into()))?;
                    (read_payload(first).await?, false, Some(e.to_string()))
                }
            }
        }
    };

    let settings = overrides.apply(state.settings.upload_settings());
    let outcome = state
        .orchestrator
        .upload(&payload, &settings, callbacks.on_upload)
        .await;

    let history_id = record_history(state, &payload, &outcome);
    let suggestions = outcome
        .result
        .failure_kind()
        .map(suggestions_for)
        .unwrap_or_default()
        .iter()
        .map(|s| s.to_string())
        .collect();

    Ok(ShareReport {
        file_name: payload.name.clone(),
        file_size: payload.size(),
        archived,
        archive_error,
        outcome,
        history_id,
        suggestions,
    })
}

async fn read_payload(entry: &FileEntry) -> crate::error::Result<FilePayload> {
    let data = tokio::fs::read(&entry.file_path).await?;
    Ok(FilePayload::new(entry.file_name.clone(), data))
}

async fn archive_folder(
    state: &UploadState,
    folder_name: &str,
    entries: &[FileEntry],
    total_size: u64,
    on_progress: Option<ArchiveProgressCallback>,
) -> crate::error::Result<FilePayload> {
    FolderArchiver::check_totals(entries.len(), total_size)?;

    let mut inputs = Vec::with_capacity(entries.len());
    for entry in entries {
        let data = tokio::fs::read(&entry.file_path).await?;
        inputs.push(ArchiveInput::new(entry.relative_path.clone(), data));
    }
    state.archiver.compress(inputs, folder_name, on_progress).await
}

/// Store a history record for a successful upload. A storage problem is
/// logged and otherwise ignored: the link has already been produced.
fn record_history(
    state: &UploadState,
    payload: &FilePayload,
    outcome: &UploadOutcome,
) -> Option<String> {
    if !state.settings.keep_upload_history {
        return None;
    }
    let link = outcome.result.link()?;
    let record = HistoryRecord::new(
        payload.name.clone(),
        payload.size(),
        link.url.clone(),
        outcome.service.clone(),
        link.expiry.clone(),
    );
    let id = record.id.clone();
    match history::add_record(&state.data_dir, record, state.settings.max_history_items) {
        Ok(()) => Some(id),
        Err(e) => {
            log::warn!("Failed to save upload history: file={}, error={}", payload.name, e);
            None
        }
    }
}

/// Generic hints shown next to a failure message.
pub fn suggestions_for(kind: FailureKind) -> &'static [&'static str] {
    match kind {
        FailureKind::Network
        | FailureKind::RemoteRejected
        | FailureKind::Timeout
        | FailureKind::Internal => &[
            "Check your internet connection",
            "Try a different upload service in Settings",
            "Use a smaller file size",
        ],
        FailureKind::SizeExceeded => &[
            "Compress your file before uploading",
            "Try a different service with higher limits",
            "Split large files into smaller parts",
        ],
        FailureKind::EmptyFile => &["Choose a file that has content"],
        FailureKind::Configuration => &["Check the upload service URLs in Settings"],
        FailureKind::Busy => &["Wait for the current upload to finish"],
        FailureKind::Validation => &[],
    }
}
