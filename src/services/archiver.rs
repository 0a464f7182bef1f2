//! Folder archiver: packs a multi-file folder selection into one zip so it
//! can be uploaded as an ordinary file.
//!
//! Two progress phases: 0–50 % while entries are added, 50–100 % while the
//! codec finalizes. The whole job is bounded by `ARCHIVE_TIMEOUT`; on expiry
//! the partial archive is dropped.

use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use zip::write::SimpleFileOptions;

use crate::error::AppError;
use crate::models::file::FilePayload;
use crate::services::progress::MonotonicGate;
use crate::services::validation::format_file_size;

pub const MAX_ARCHIVE_FILES: usize = 100;
pub const MAX_ARCHIVE_BYTES: u64 = 50 * 1024 * 1024;
pub const ARCHIVE_TIMEOUT: Duration = Duration::from_secs(30);
/// Yield to the scheduler after this many inserted files.
pub const YIELD_EVERY: usize = 10;
pub const ARCHIVE_MIME: &str = "application/zip";
const DEFLATE_LEVEL: i64 = 6;

/// One input file: its path inside the archive and its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveInput {
    pub relative_path: String,
    pub data: Bytes,
}

impl ArchiveInput {
    pub fn new(relative_path: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            relative_path: relative_path.into(),
            data: data.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveProgress {
    pub percentage: u8,
    pub message: String,
}

pub type ArchiveProgressCallback = Arc<dyn Fn(ArchiveProgress) + Send + Sync>;

/// An archive being assembled for one job.
pub trait ArchiveWriter: Send {
    fn add_entry(&mut self, path: &str, data: Bytes) -> crate::error::Result<()>;

    /// Produce the archive bytes, reporting codec completion in `0.0..=100.0`.
    /// Writers should stop early once `cancelled` is set.
    fn finish(
        self: Box<Self>,
        on_percent: &mut dyn FnMut(f64),
        cancelled: &AtomicBool,
    ) -> crate::error::Result<Vec<u8>>;
}

/// Compression library handle injected into the archiver.
pub trait ArchiveCodec: Send + Sync {
    fn start(&self) -> Box<dyn ArchiveWriter>;
}

/// Deflate zip codec. Entries carry a fixed timestamp so identical inputs
/// produce identical archive contents.
#[derive(Debug, Clone, Copy)]
pub struct ZipCodec {
    level: i64,
}

impl Default for ZipCodec {
    fn default() -> Self {
        Self {
            level: DEFLATE_LEVEL,
        }
    }
}

impl ArchiveCodec for ZipCodec {
    fn start(&self) -> Box<dyn ArchiveWriter> {
        Box::new(ZipArchiveWriter {
            level: self.level,
            entries: Vec::new(),
        })
    }
}

struct ZipArchiveWriter {
    level: i64,
    entries: Vec<(String, Bytes)>,
}

impl ArchiveWriter for ZipArchiveWriter {
    fn add_entry(&mut self, path: &str, data: Bytes) -> crate::error::Result<()> {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            return Err(AppError::Archive("Archive entry has an empty path".into()));
        }
        self.entries.push((path.to_string(), data));
        Ok(())
    }

    fn finish(
        self: Box<Self>,
        on_percent: &mut dyn FnMut(f64),
        cancelled: &AtomicBool,
    ) -> crate::error::Result<Vec<u8>> {
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .compression_level(Some(self.level))
            .last_modified_time(zip::DateTime::default());
        let total: u64 = self.entries.iter().map(|(_, d)| d.len() as u64).sum();
        let mut written: u64 = 0;
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));

        for (path, data) in &self.entries {
            if cancelled.load(Ordering::Acquire) {
                return Err(AppError::Archive("Archive job cancelled".into()));
            }
            zip.start_file(path.as_str(), options)?;
            zip.write_all(data)?;
            written += data.len() as u64;
            let pct = if total == 0 {
                100.0
            } else {
                written as f64 * 100.0 / total as f64
            };
            on_percent(pct);
        }

        let cursor = zip.finish()?;
        on_percent(100.0);
        Ok(cursor.into_inner())
    }
}

/// Bookkeeping for one compression call.
struct ArchiveJob {
    archive_name: String,
    total_files: usize,
    files_done: usize,
    bytes_done: u64,
    gate: MonotonicGate,
    on_progress: Option<ArchiveProgressCallback>,
    /// Set when the job timed out; silences progress and stops the codec.
    cancelled: Arc<AtomicBool>,
}

impl ArchiveJob {
    fn emit(&self, percentage: u8, message: String) {
        if self.cancelled.load(Ordering::Acquire) {
            return;
        }
        if self.gate.admit(percentage) {
            if let Some(cb) = &self.on_progress {
                cb(ArchiveProgress {
                    percentage,
                    message,
                });
            }
        }
    }

    /// Adding phase maps onto 0–50 %.
    fn adding_percentage(&self) -> u8 {
        if self.total_files == 0 {
            return 50;
        }
        ((self.files_done as f64 / self.total_files as f64) * 50.0).round() as u8
    }
}

pub struct FolderArchiver {
    codec: Arc<dyn ArchiveCodec>,
    timeout: Duration,
}

impl FolderArchiver {
    pub fn new(codec: Arc<dyn ArchiveCodec>) -> Self {
        Self {
            codec,
            timeout: ARCHIVE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reject inputs over the file-count or byte ceilings before any work.
    pub fn check_limits(files: &[ArchiveInput]) -> crate::error::Result<()> {
        let total: u64 = files.iter().map(|f| f.data.len() as u64).sum();
        Self::check_totals(files.len(), total)
    }

    /// Same ceilings as `check_limits`, from counts alone. Lets callers refuse
    /// a folder before reading it into memory.
    pub fn check_totals(file_count: usize, total_bytes: u64) -> crate::error::Result<()> {
        if file_count == 0 {
            return Err(AppError::Validation("No files to archive".into()));
        }
        if file_count > MAX_ARCHIVE_FILES {
            return Err(AppError::Validation(format!(
                "Too many files ({}). Maximum {} files per folder.",
                file_count, MAX_ARCHIVE_FILES
            )));
        }
        if total_bytes > MAX_ARCHIVE_BYTES {
            return Err(AppError::Validation(format!(
                "Folder too large ({}). Maximum {}.",
                format_file_size(total_bytes),
                format_file_size(MAX_ARCHIVE_BYTES)
            )));
        }
        Ok(())
    }

    /// Archive name for `folder_name` at `millis` since the epoch.
    pub fn archive_name(folder_name: &str, millis: i64) -> String {
        let base = folder_name.trim().trim_matches('/');
        let base = if base.is_empty() { "folder" } else { base };
        format!("{}-{}.zip", base, millis)
    }

    pub async fn compress(
        &self,
        files: Vec<ArchiveInput>,
        folder_name: &str,
        on_progress: Option<ArchiveProgressCallback>,
    ) -> crate::error::Result<FilePayload> {
        Self::check_limits(&files)?;

        let cancelled = Arc::new(AtomicBool::new(false));
        let job = ArchiveJob {
            archive_name: Self::archive_name(folder_name, chrono::Utc::now().timestamp_millis()),
            total_files: files.len(),
            files_done: 0,
            bytes_done: 0,
            gate: MonotonicGate::default(),
            on_progress,
            cancelled: cancelled.clone(),
        };
        log::info!(
            "Compressing folder: name={}, files={}",
            job.archive_name,
            job.total_files
        );

        match tokio::time::timeout(self.timeout, self.run(job, files)).await {
            Ok(result) => result,
            Err(_) => {
                cancelled.store(true, Ordering::Release);
                log::warn!("Folder compression timed out after {:?}", self.timeout);
                Err(AppError::Timeout(format!(
                    "Compression timeout after {} seconds",
                    self.timeout.as_secs_f64()
                )))
            }
        }
    }

    async fn run(
        &self,
        mut job: ArchiveJob,
        files: Vec<ArchiveInput>,
    ) -> crate::error::Result<FilePayload> {
        let mut writer = self.codec.start();
        job.emit(0, "Preparing archive...".into());

        for file in files {
            writer.add_entry(&file.relative_path, file.data.clone())?;
            job.files_done += 1;
            job.bytes_done += file.data.len() as u64;
            job.emit(
                job.adding_percentage(),
                format!(
                    "Adding files to archive... ({}/{})",
                    job.files_done, job.total_files
                ),
            );
            if job.files_done % YIELD_EVERY == 0 {
                tokio::task::yield_now().await;
            }
        }

        let job = Arc::new(job);
        let finish_job = job.clone();
        let data = tokio::task::spawn_blocking(move || {
            let cancelled = finish_job.cancelled.clone();
            writer.finish(
                &mut |pct: f64| {
                    let pct = 50 + (pct.clamp(0.0, 100.0) * 0.5).round() as u8;
                    finish_job.emit(pct, format!("Compressing... {}%", (pct - 50) * 2));
                },
                &cancelled,
            )
        })
        .await
        .map_err(|e| AppError::Internal(format!("spawn_blocking join error: {}", e)))??;

        job.emit(100, "Archive ready".into());
        log::info!(
            "Folder compressed: name={}, input_bytes={}, archive_bytes={}",
            job.archive_name,
            job.bytes_done,
            data.len()
        );

        Ok(FilePayload::new(job.archive_name.clone(), data).with_content_type(ARCHIVE_MIME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::sync::Mutex;

    fn inputs(count: usize, size: usize) -> Vec<ArchiveInput> {
        (0..count)
            .map(|i| ArchiveInput::new(format!("docs/file-{:03}.txt", i), vec![b'a' + (i % 26) as u8; size]))
            .collect()
    }

    fn archiver() -> FolderArchiver {
        FolderArchiver::new(Arc::new(ZipCodec::default()))
    }

    fn read_entries(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        let mut entries = Vec::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).unwrap();
            let mut data = Vec::new();
            entry.read_to_end(&mut data).unwrap();
            entries.push((entry.name().to_string(), data));
        }
        entries
    }

    #[tokio::test]
    async fn test_too_many_files_is_rejected() {
        let err = archiver().compress(inputs(150, 1), "docs", None).await.unwrap_err();
        match err {
            AppError::Validation(msg) => assert!(msg.contains("Too many files (150)"), "got: {}", msg),
            other => panic!("Expected AppError::Validation, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_oversized_folder_is_rejected() {
        // 60 files of 1 MiB
        let err = archiver()
            .compress(inputs(60, 1024 * 1024), "docs", None)
            .await
            .unwrap_err();
        match err {
            AppError::Validation(msg) => assert!(msg.contains("Folder too large (60 MB)"), "got: {}", msg),
            other => panic!("Expected AppError::Validation, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_selection_is_rejected() {
        assert!(archiver().compress(Vec::new(), "docs", None).await.is_err());
    }

    #[tokio::test]
    async fn test_archive_contains_every_file_at_its_path() {
        let files = inputs(3, 10);
        let payload = archiver().compress(files.clone(), "docs", None).await.unwrap();

        assert!(payload.name.starts_with("docs-"));
        assert!(payload.name.ends_with(".zip"));
        assert_eq!(payload.mime(), "application/zip");

        let entries = read_entries(&payload.data);
        assert_eq!(entries.len(), 3);
        for (entry, input) in entries.iter().zip(files.iter()) {
            assert_eq!(entry.0, input.relative_path);
            assert_eq!(entry.1, input.data.to_vec());
        }
    }

    #[tokio::test]
    async fn test_same_input_twice_gives_same_contents() {
        let files = inputs(12, 100);
        let first = archiver().compress(files.clone(), "docs", None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
        let second = archiver().compress(files, "docs", None).await.unwrap();

        assert_eq!(read_entries(&first.data), read_entries(&second.data));
        assert_ne!(first.name, second.name);
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_ends_at_100() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let clone = seen.clone();
        let cb: ArchiveProgressCallback = Arc::new(move |p: ArchiveProgress| {
            clone.lock().unwrap().push(p.percentage);
        });

        archiver().compress(inputs(25, 1000), "docs", Some(cb)).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.first(), Some(&0));
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]), "not monotonic: {:?}", seen);
        assert!(seen.contains(&50));
    }

    struct StallingCodec;

    struct StallingWriter;

    impl ArchiveWriter for StallingWriter {
        fn add_entry(&mut self, _path: &str, _data: Bytes) -> crate::error::Result<()> {
            Ok(())
        }

        fn finish(
            self: Box<Self>,
            _on_percent: &mut dyn FnMut(f64),
            _cancelled: &AtomicBool,
        ) -> crate::error::Result<Vec<u8>> {
            std::thread::sleep(Duration::from_millis(300));
            Ok(Vec::new())
        }
    }

    impl ArchiveCodec for StallingCodec {
        fn start(&self) -> Box<dyn ArchiveWriter> {
            Box::new(StallingWriter)
        }
    }

    #[tokio::test]
    async fn test_stalled_codec_times_out() {
        let archiver =
            FolderArchiver::new(Arc::new(StallingCodec)).with_timeout(Duration::from_millis(20));
        let err = archiver.compress(inputs(2, 10), "docs", None).await.unwrap_err();
        assert!(matches!(err, AppError::Timeout(_)), "got: {:?}", err);
    }

    /// Stalls in `finish`, then reports late progress and records whether it
    /// saw the cancellation flag.
    struct LateCodec {
        saw_cancel: Arc<AtomicBool>,
    }

    struct LateWriter {
        saw_cancel: Arc<AtomicBool>,
    }

    impl ArchiveWriter for LateWriter {
        fn add_entry(&mut self, _path: &str, _data: Bytes) -> crate::error::Result<()> {
            Ok(())
        }

        fn finish(
            self: Box<Self>,
            on_percent: &mut dyn FnMut(f64),
            cancelled: &AtomicBool,
        ) -> crate::error::Result<Vec<u8>> {
            std::thread::sleep(Duration::from_millis(200));
            self.saw_cancel
                .store(cancelled.load(Ordering::Acquire), Ordering::Release);
            on_percent(60.0);
            on_percent(100.0);
            Ok(Vec::new())
        }
    }

    impl ArchiveCodec for LateCodec {
        fn start(&self) -> Box<dyn ArchiveWriter> {
            Box::new(LateWriter {
                saw_cancel: self.saw_cancel.clone(),
            })
        }
    }

    #[tokio::test]
    async fn test_no_progress_after_timeout() {
        let saw_cancel = Arc::new(AtomicBool::new(false));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let clone = seen.clone();
        let cb: ArchiveProgressCallback = Arc::new(move |p: ArchiveProgress| {
            clone.lock().unwrap().push(p.percentage);
        });
        let archiver = FolderArchiver::new(Arc::new(LateCodec {
            saw_cancel: saw_cancel.clone(),
        }))
        .with_timeout(Duration::from_millis(20));

        let err = archiver.compress(inputs(2, 10), "docs", Some(cb)).await.unwrap_err();
        assert!(matches!(err, AppError::Timeout(_)), "got: {:?}", err);
        let at_return = seen.lock().unwrap().clone();

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(*seen.lock().unwrap(), at_return);
        assert!(at_return.iter().all(|p| *p <= 50), "got: {:?}", at_return);
        assert!(saw_cancel.load(Ordering::Acquire));
    }

    #[test]
    fn test_zip_writer_stops_when_cancelled() {
        let mut writer = ZipCodec::default().start();
        writer.add_entry("a.txt", Bytes::from_static(b"a")).unwrap();
        let cancelled = AtomicBool::new(true);
        let err = writer.finish(&mut |_| {}, &cancelled).unwrap_err();
        assert!(matches!(err, AppError::Archive(_)));
    }

    #[tokio::test]
    async fn test_sub_second_timeout_message() {
        let archiver =
            FolderArchiver::new(Arc::new(StallingCodec)).with_timeout(Duration::from_millis(20));
        let err = archiver.compress(inputs(2, 10), "docs", None).await.unwrap_err();
        assert_eq!(err.to_string(), "Timeout: Compression timeout after 0.02 seconds");
    }

    struct BrokenCodec;

    struct BrokenWriter;

    impl ArchiveWriter for BrokenWriter {
        fn add_entry(&mut self, path: &str, _data: Bytes) -> crate::error::Result<()> {
            Err(AppError::Archive(format!("cannot add {}", path)))
        }

        fn finish(
            self: Box<Self>,
            _on_percent: &mut dyn FnMut(f64),
            _cancelled: &AtomicBool,
        ) -> crate::error::Result<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    impl ArchiveCodec for BrokenCodec {
        fn start(&self) -> Box<dyn ArchiveWriter> {
            Box::new(BrokenWriter)
        }
    }

    #[tokio::test]
    async fn test_codec_error_aborts() {
        let archiver = FolderArchiver::new(Arc::new(BrokenCodec));
        let err = archiver.compress(inputs(2, 10), "docs", None).await.unwrap_err();
        assert!(matches!(err, AppError::Archive(_)));
    }

    #[test]
    fn test_archive_name_defaults_to_folder() {
        assert_eq!(FolderArchiver::archive_name("", 42), "folder-42.zip");
        assert_eq!(FolderArchiver::archive_name("photos", 42), "photos-42.zip");
    }

    #[test]
    fn test_check_totals_matches_ceilings() {
        assert!(FolderArchiver::check_totals(100, MAX_ARCHIVE_BYTES).is_ok());
        assert!(FolderArchiver::check_totals(101, 1).is_err());
        assert!(FolderArchiver::check_totals(1, MAX_ARCHIVE_BYTES + 1).is_err());
        assert!(FolderArchiver::check_totals(0, 0).is_err());
    }

    #[test]
    fn test_zip_writer_rejects_empty_path() {
        let mut writer = ZipCodec::default().start();
        assert!(writer.add_entry("/", Bytes::from_static(b"x")).is_err());
    }
}
