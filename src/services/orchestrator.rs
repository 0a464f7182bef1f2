//! Upload orchestrator: validates a file, uploads it through the chosen
//! service and walks the fallback order until one service succeeds.
//!
//! Attempts are strictly sequential: attempt N+1 starts only after attempt N
//! has produced a result. The orchestrator never returns `Err`; every outcome,
//! including configuration problems, comes back as an `UploadOutcome`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::api::UploadHandler;
use crate::models::file::FilePayload;
use crate::models::upload::{
    AttemptRecord, FailureKind, ProgressCallback, UploadFailure, UploadOptions, UploadOutcome,
    UploadResult, UploadSettings,
};
use crate::services::fallback::{should_fall_back, OrchestratorConfig};
use crate::services::progress::UploadProgressTracker;
use crate::services::registry::ServiceRegistry;
use crate::services::validation::validate_file;

/// Session-scoped upload coordinator.
///
/// Holds the "upload in progress" flag for its session, so a second call made
/// while one is running is refused instead of racing the first.
pub struct UploadOrchestrator {
    registry: Arc<ServiceRegistry>,
    config: OrchestratorConfig,
    in_progress: AtomicBool,
}

/// Clears the in-progress flag however the upload ends.
struct InProgressGuard<'a>(&'a AtomicBool);

impl Drop for InProgressGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl UploadOrchestrator {
    pub fn new(registry: Arc<ServiceRegistry>, config: OrchestratorConfig) -> Self {
        Self {
            registry,
            config,
            in_progress: AtomicBool::new(false),
        }
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn is_uploading(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    pub async fn upload(
        &self,
        file: &FilePayload,
        settings: &UploadSettings,
        on_progress: Option<ProgressCallback>,
    ) -> UploadOutcome {
        if self
            .in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::warn!("Upload already in progress, ignoring request for '{}'", file.name);
            return UploadOutcome::rejected(
                UploadFailure::new(FailureKind::Busy, "An upload is already in progress"),
                Vec::new(),
            );
        }
        let _guard = InProgressGuard(&self.in_progress);

        let primary = match self.registry.resolve(&settings.service) {
            Ok(handler) => handler,
            Err(e) => {
                log::error!("Cannot upload '{}': {}", file.name, e);
                return UploadOutcome::rejected(e.into(), Vec::new());
            }
        };

        let report = validate_file(file, primary.max_file_size());
        for warning in &report.warnings {
            log::warn!("File warning: file={}, warning={}", file.name, warning);
        }
        if let Some(failure) = report.failure() {
            log::warn!(
                "Pre-flight check failed: file={}, service={}, error={}",
                file.name,
                primary.name(),
                failure.message
            );
            return UploadOutcome::rejected(failure, report.warnings);
        }

        let mut attempts: Vec<AttemptRecord> = Vec::new();
        let mut tried: Vec<String> = Vec::new();

        let mut service = primary.name().to_string();
        let mut result = self.attempt(&primary, file, settings, &on_progress).await;
        tried.push(service.clone());
        attempts.push(AttemptRecord {
            service: service.clone(),
            error: result.error().map(str::to_string),
        });

        if !result.is_success() && result.failure_kind().is_some_and(should_fall_back) {
            log::info!("Primary service '{}' failed, trying fallbacks", service);
            let candidates: Vec<String> = self
                .config
                .candidates(&tried)
                .map(str::to_string)
                .collect();
            for name in candidates {
                let Some(handler) = self.registry.get(&name) else {
                    continue;
                };
                if file.size() > handler.max_file_size() {
                    log::info!(
                        "Skipping fallback '{}': file={} exceeds its {} byte limit",
                        name,
                        file.name,
                        handler.max_file_size()
                    );
                    continue;
                }

                log::info!("Trying fallback service: {}", name);
                let next = self.attempt(&handler, file, settings, &on_progress).await;
                tried.push(name.clone());
                attempts.push(AttemptRecord {
                    service: name.clone(),
                    error: next.error().map(str::to_string),
                });
                service = name;
                result = next;
                if result.is_success() {
                    break;
                }
            }
        }

        match &result {
            UploadResult::Success(link) => {
                log::info!("Upload succeeded: file={}, service={}, link={}", file.name, service, link.url)
            }
            UploadResult::Failure(f) => log::error!(
                "Upload failed on every service: file={}, attempts={}, last_error={}",
                file.name,
                attempts.len(),
                f.message
            ),
        }

        UploadOutcome {
            result,
            service,
            attempts,
            warnings: report.warnings,
        }
    }

    /// One bounded handler invocation with fresh progress.
    async fn attempt(
        &self,
        handler: &Arc<dyn UploadHandler>,
        file: &FilePayload,
        settings: &UploadSettings,
        on_progress: &Option<ProgressCallback>,
    ) -> UploadResult {
        let tracker = UploadProgressTracker::start(on_progress.clone());
        let options = UploadOptions {
            expiration: settings.expiration.clone(),
            max_downloads: settings.max_downloads,
            on_progress: Some(tracker.callback()),
        };

        match tokio::time::timeout(self.config.attempt_timeout, handler.upload(file, &options))
            .await
        {
            Ok(result) => result,
            Err(_) => {
                log::warn!(
                    "Upload attempt timed out: service={}, timeout={:?}, progress={}%",
                    handler.name(),
                    self.config.attempt_timeout,
                    tracker.last_percentage().unwrap_or(0)
                );
                UploadResult::failure(
                    FailureKind::Timeout,
                    format!(
                        "Upload timed out after {} seconds",
                        self.config.attempt_timeout.as_secs_f64()
                    ),
                )
            }
        }
    }
}
