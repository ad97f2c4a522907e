//! Local filesystem media storage
//!
//! Every call re-stats or re-opens the file; nothing is cached between
//! requests, so a replaced file is picked up on the next request.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use futures::stream;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, Take};
use tracing::{debug, warn};

use super::{ByteStream, MediaStorage, StorageError};

/// Media storage rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalMediaStorage {
    root: PathBuf,
    read_buffer_size: usize,
}

impl LocalMediaStorage {
    /// Creates storage resolving catalog paths against `root`.
    ///
    /// `read_buffer_size` bounds the bytes held in memory per read.
    pub fn new(root: impl Into<PathBuf>, read_buffer_size: usize) -> Self {
        Self {
            root: root.into(),
            read_buffer_size: read_buffer_size.max(1),
        }
    }

    /// Directory catalog paths are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn size_of(&self, path: &Path) -> Result<u64, StorageError> {
        let full_path = self.resolve(path);
        let metadata = tokio::fs::metadata(&full_path)
            .await
            .map_err(|e| StorageError::from_io(&full_path, e))?;

        if !metadata.is_file() {
            return Err(StorageError::Missing { path: full_path });
        }

        Ok(metadata.len())
    }

    async fn read_range(
        &self,
        path: &Path,
        start: u64,
        end: u64,
    ) -> Result<ByteStream, StorageError> {
        let full_path = self.resolve(path);
        let mut file = File::open(&full_path)
            .await
            .map_err(|e| StorageError::from_io(&full_path, e))?;
        file.seek(SeekFrom::Start(start))
            .await
            .map_err(|e| StorageError::from_io(&full_path, e))?;

        let length = end.saturating_sub(start) + 1;
        debug!(
            "Opened {} for bytes {}-{} ({} bytes)",
            full_path.display(),
            start,
            end,
            length
        );

        let reader = RangeReader {
            file: file.take(length),
            remaining: length,
            path: full_path,
        };
        Ok(read_chunks(reader, self.read_buffer_size))
    }

    fn storage_type(&self) -> &'static str {
        "local_media_storage"
    }
}

/// Open file handle limited to one byte window.
///
/// Owned by the body stream; dropping the stream (completion or client
/// disconnect) closes the file.
struct RangeReader {
    file: Take<File>,
    remaining: u64,
    path: PathBuf,
}

impl Drop for RangeReader {
    fn drop(&mut self) {
        if self.remaining > 0 {
            debug!(
                "Released {} with {} bytes unsent",
                self.path.display(),
                self.remaining
            );
        }
    }
}

/// Yields the window in reads of at most `buffer_size` bytes. A read only
/// happens when the consumer polls, so transport backpressure reaches the file.
fn read_chunks(reader: RangeReader, buffer_size: usize) -> ByteStream {
    Box::pin(stream::try_unfold(reader, move |mut reader| async move {
        if reader.remaining == 0 {
            return Ok(None);
        }

        let want = reader.remaining.min(buffer_size as u64) as usize;
        let mut buffer = BytesMut::with_capacity(want);
        let mut limited = (&mut buffer).limit(want);
        let read = reader.file.read_buf(&mut limited).await.inspect_err(|e| {
            warn!("Read failed on {}: {}", reader.path.display(), e);
        })?;

        if read == 0 {
            warn!(
                "{} ended {} bytes early; file changed while streaming",
                reader.path.display(),
                reader.remaining
            );
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "media file shorter than advertised window",
            ));
        }

        reader.remaining -= read as u64;
        let chunk: Bytes = buffer.freeze();
        Ok(Some((chunk, reader)))
    }))
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;

    use super::*;
    use crate::storage::test_fixtures::{create_media_library, patterned_bytes};

    async fn collect(stream: ByteStream) -> Vec<u8> {
        let chunks: Vec<Bytes> = stream.try_collect().await.unwrap();
        chunks.concat()
    }

    #[tokio::test]
    async fn test_size_of() {
        let library = create_media_library(&[("a.flac", 1024)]);
        let storage = LocalMediaStorage::new(library.path(), 64);

        assert_eq!(storage.size_of(Path::new("a.flac")).await.unwrap(), 1024);
        assert_eq!(storage.storage_type(), "local_media_storage");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let library = create_media_library(&[]);
        let storage = LocalMediaStorage::new(library.path(), 64);

        let result = storage.size_of(Path::new("gone.opus")).await;
        assert!(matches!(result, Err(StorageError::Missing { .. })));

        let result = storage.read_range(Path::new("gone.opus"), 0, 9).await;
        assert!(matches!(result, Err(StorageError::Missing { .. })));
    }

    #[tokio::test]
    async fn test_directory_is_not_media() {
        let library = create_media_library(&[("nested/a.opus", 10)]);
        let storage = LocalMediaStorage::new(library.path(), 64);

        let result = storage.size_of(Path::new("nested")).await;
        assert!(matches!(result, Err(StorageError::Missing { .. })));
    }

    #[tokio::test]
    async fn test_read_range_inclusive() {
        let library = create_media_library(&[("a.flac", 1000)]);
        let storage = LocalMediaStorage::new(library.path(), 64);

        let stream = storage
            .read_range(Path::new("a.flac"), 100, 199)
            .await
            .unwrap();
        let bytes = collect(stream).await;

        assert_eq!(bytes.len(), 100);
        assert_eq!(bytes, patterned_bytes(1000)[100..200].to_vec());
    }

    #[tokio::test]
    async fn test_read_range_bounded_chunks() {
        let library = create_media_library(&[("a.flac", 1000)]);
        let storage = LocalMediaStorage::new(library.path(), 64);

        let stream = storage
            .read_range(Path::new("a.flac"), 0, 999)
            .await
            .unwrap();
        let chunks: Vec<Bytes> = stream.try_collect().await.unwrap();

        assert!(chunks.iter().all(|chunk| chunk.len() <= 64));
        assert_eq!(chunks.len(), 16);
        assert_eq!(chunks.concat(), patterned_bytes(1000));
    }

    #[tokio::test]
    async fn test_truncated_file_errors() {
        let library = create_media_library(&[("a.opus", 100)]);
        let storage = LocalMediaStorage::new(library.path(), 64);

        let stream = storage
            .read_range(Path::new("a.opus"), 50, 149)
            .await
            .unwrap();
        let result: Result<Vec<Bytes>, _> = stream.try_collect().await;

        let err = result.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn test_dropping_stream_early() {
        let library = create_media_library(&[("a.opus", 4096)]);
        let storage = LocalMediaStorage::new(library.path(), 512);

        let mut stream = storage
            .read_range(Path::new("a.opus"), 0, 4095)
            .await
            .unwrap();
        let first = stream.try_next().await.unwrap().unwrap();
        assert_eq!(first.len(), 512);
        drop(stream);

        let again = storage
            .read_range(Path::new("a.opus"), 512, 1023)
            .await
            .unwrap();
        assert_eq!(collect(again).await, patterned_bytes(4096)[512..1024].to_vec());
    }
}
