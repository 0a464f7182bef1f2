//! Shared HTTP plumbing for upload handlers: client construction and a
//! request body that reports byte-level progress while it is streamed.

use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::{self, Stream, StreamExt};

use crate::error::AppError;
use crate::models::upload::{UploadOptions, UploadProgress};

pub const USER_AGENT: &str = concat!("EasyShare/", env!("CARGO_PKG_VERSION"));

/// Size of each piece handed to the connection.
pub const STREAM_CHUNK_SIZE: usize = 64 * 1024;

pub fn build_client(timeout: Duration) -> crate::error::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))
}

/// Split `data` into fixed-size pieces without copying.
pub(crate) fn split_chunks(data: &Bytes, chunk_size: usize) -> Vec<Bytes> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::with_capacity(data.len() / chunk_size + 1);
    let mut offset = 0;
    while offset < data.len() {
        let end = (offset + chunk_size).min(data.len());
        chunks.push(data.slice(offset..end));
        offset = end;
    }
    chunks
}

/// Split `data` into `STREAM_CHUNK_SIZE` pieces and call `options.on_progress`
/// as each piece is pulled.
pub(crate) fn progress_stream(
    data: Bytes,
    options: &UploadOptions,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
    let total = data.len() as u64;
    let chunks = split_chunks(&data, STREAM_CHUNK_SIZE);
    let options = options.clone();
    let mut sent: u64 = 0;
    stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        options.report(UploadProgress::from_bytes(sent, total));
        Ok(chunk)
    })
}

/// Streaming request body that reports byte-level progress.
pub fn progress_body(data: Bytes, options: &UploadOptions) -> reqwest::Body {
    reqwest::Body::wrap_stream(progress_stream(data, options))
}

/// Read a response body as text, mapping the error into `AppError`.
pub async fn response_text(resp: reqwest::Response) -> crate::error::Result<String> {
    Ok(resp.text().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_split_chunks_covers_all_bytes() {
        let data = Bytes::from(vec![7u8; 10]);
        let chunks = split_chunks(&data, 4);
        let sizes: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
    }

    #[test]
    fn test_split_chunks_empty_input() {
        assert!(split_chunks(&Bytes::new(), 4).is_empty());
    }

    #[test]
    fn test_split_chunks_zero_size_does_not_loop() {
        let data = Bytes::from_static(b"abc");
        assert_eq!(split_chunks(&data, 0).len(), 3);
    }

    #[tokio::test]
    async fn test_progress_stream_reports_bytes() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let clone = seen.clone();
        let options = UploadOptions {
            on_progress: Some(Arc::new(move |p: UploadProgress| {
                clone.lock().unwrap().push(p.percentage);
            })),
            ..UploadOptions::default()
        };
        let data = Bytes::from(vec![3u8; 200 * 1024]);

        let chunks: Vec<Bytes> = progress_stream(data.clone(), &options)
            .map(|c| c.unwrap())
            .collect()
            .await;

        let sent: usize = chunks.iter().map(|c| c.len()).sum();
        assert_eq!(sent, data.len());
        assert_eq!(chunks.len(), 4);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]), "not monotonic: {:?}", seen);
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.iter().all(|p| *p <= 100));
    }

    #[tokio::test]
    async fn test_progress_stream_without_callback() {
        let data = Bytes::from_static(b"hello");
        let chunks: Vec<_> = progress_stream(data, &UploadOptions::default()).collect().await;
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_build_client_succeeds() {
        assert!(build_client(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_user_agent_carries_version() {
        assert!(USER_AGENT.starts_with("EasyShare/"));
    }
}
