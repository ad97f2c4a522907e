//! Test fixtures for media storage testing.
//!
//! Provides on-disk media libraries with deterministic content and a storage
//! wrapper that records which files were touched.

use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use parking_lot::Mutex;

use super::{ByteStream, MediaStorage, StorageError};

/// Deterministic file content: byte `i` is `i % 251`.
///
/// The prime modulus keeps chunk boundaries from lining up with the pattern.
pub fn patterned_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Creates a temporary media root holding `files` as `(relative path, size)`.
///
/// # Panics
///
/// Panics if the temporary directory or any file cannot be created.
/// This is acceptable in test fixtures where failures indicate environment issues.
pub fn create_media_library(files: &[(&str, usize)]) -> tempfile::TempDir {
    let root = tempfile::tempdir().unwrap();
    for (relative, size) in files {
        let path = root.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, patterned_bytes(*size)).unwrap();
    }
    root
}

/// Storage wrapper counting size, open and release calls on the wrapped storage.
pub struct RecordingStorage {
    inner: Arc<dyn MediaStorage>,
    size_calls: AtomicUsize,
    opened: Mutex<Vec<PathBuf>>,
    released: Arc<AtomicUsize>,
}

impl RecordingStorage {
    pub fn new(inner: Arc<dyn MediaStorage>) -> Self {
        Self {
            inner,
            size_calls: AtomicUsize::new(0),
            opened: Mutex::new(Vec::new()),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of streams returned by `read_range` that have been dropped
    pub fn released_count(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Streams returned by `read_range` that are still alive
    pub fn open_streams(&self) -> usize {
        self.opened.lock().len() - self.released_count()
    }

    /// Number of `size_of` calls seen
    pub fn size_calls(&self) -> usize {
        self.size_calls.load(Ordering::SeqCst)
    }

    /// Paths `read_range` opened successfully, in call order
    pub fn opened_paths(&self) -> Vec<PathBuf> {
        self.opened.lock().clone()
    }
}

#[async_trait]
impl MediaStorage for RecordingStorage {
    async fn size_of(&self, path: &Path) -> Result<u64, StorageError> {
        self.size_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.size_of(path).await
    }

    async fn read_range(
        &self,
        path: &Path,
        start: u64,
        end: u64,
    ) -> Result<ByteStream, StorageError> {
        let inner = self.inner.read_range(path, start, end).await?;
        self.opened.lock().push(path.to_path_buf());
        Ok(Box::pin(TrackedStream {
            inner,
            released: self.released.clone(),
        }))
    }

    fn storage_type(&self) -> &'static str {
        "recording_storage"
    }
}

/// Byte stream that counts itself released when dropped.
struct TrackedStream {
    inner: ByteStream,
    released: Arc<AtomicUsize>,
}

impl Stream for TrackedStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl Drop for TrackedStream {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;
    use crate::storage::LocalMediaStorage;

    #[test]
    fn test_create_media_library() {
        let library = create_media_library(&[("flac/a.flac", 300), ("opus/a.opus", 10)]);

        let flac = std::fs::read(library.path().join("flac/a.flac")).unwrap();
        assert_eq!(flac.len(), 300);
        assert_eq!(flac[251], 0);
        assert_eq!(flac[252], 1);
        assert!(library.path().join("opus/a.opus").is_file());
    }

    #[tokio::test]
    async fn test_recording_storage_counts_releases() {
        let library = create_media_library(&[("a.opus", 1000)]);
        let storage = RecordingStorage::new(Arc::new(LocalMediaStorage::new(library.path(), 100)));

        let mut stream = storage
            .read_range(Path::new("a.opus"), 0, 999)
            .await
            .unwrap();
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.len(), 100);
        assert_eq!(storage.open_streams(), 1);

        drop(stream);
        assert_eq!(storage.released_count(), 1);
        assert_eq!(storage.open_streams(), 0);

        assert!(storage.read_range(Path::new("gone.opus"), 0, 9).await.is_err());
        assert_eq!(storage.opened_paths(), vec![PathBuf::from("a.opus")]);
    }
}
