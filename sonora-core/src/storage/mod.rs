//! Byte storage for encoded audio files.
//!
//! Defines the storage interface the streaming engine reads through, with a
//! local filesystem implementation.

pub mod local;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;

use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

pub use local::LocalMediaStorage;

/// Stream of file bytes handed to the HTTP body.
pub type ByteStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// Read-only access to stored media bytes.
///
/// Paths are the catalog's storage paths; implementations map them onto
/// their backing store.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Measures the current size of the file at `path`.
    ///
    /// # Errors
    ///
    /// - `StorageError::Missing` - No file at this path
    /// - `StorageError::Io` - File system operation failed
    async fn size_of(&self, path: &Path) -> Result<u64, StorageError>;

    /// Opens `path` and returns its bytes from `start` through `end` inclusive.
    ///
    /// The file is opened and positioned before this returns, so open failures
    /// surface here rather than mid-stream. The handle is released when the
    /// stream finishes or is dropped.
    ///
    /// # Errors
    ///
    /// - `StorageError::Missing` - No file at this path
    /// - `StorageError::Io` - Open or seek failed
    async fn read_range(&self, path: &Path, start: u64, end: u64)
    -> Result<ByteStream, StorageError>;

    /// Short name of the backing store, for logs.
    fn storage_type(&self) -> &'static str;
}

/// Errors that occur while reading stored media.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The catalog names a file that is not in storage
    #[error("Media file missing: {}", path.display())]
    Missing {
        /// Resolved location that was looked up
        path: PathBuf,
    },

    /// Standard I/O error occurred
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Resolved location being accessed
        path: PathBuf,
        /// The underlying I/O error
        source: io::Error,
    },
}

impl StorageError {
    /// Classifies an I/O error raised while accessing `path`.
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            StorageError::Missing {
                path: path.to_path_buf(),
            }
        } else {
            StorageError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}
