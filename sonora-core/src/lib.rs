//! Sonora Core - catalog model and byte-range audio streaming
//!
//! This crate provides the building blocks of the Sonora media backend: the
//! song catalog and account contracts, media storage, the partial-content
//! streaming engine, and configuration management.

pub mod accounts;
pub mod catalog;
pub mod config;
pub mod storage;
pub mod streaming;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use accounts::{AccountError, AccountStore, FormatPreference, InMemoryAccountStore};
pub use catalog::{CatalogManifest, CatalogStore, InMemoryCatalog, ManifestError};
pub use config::SonoraConfig;
pub use storage::{LocalMediaStorage, MediaStorage, StorageError};
pub use streaming::{StreamingEngine, StreamingError};

/// Errors that can bubble up from any Sonora subsystem.
#[derive(Debug, thiserror::Error)]
pub enum SonoraError {
    #[error("Streaming error: {0}")]
    Streaming(#[from] StreamingError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Catalog error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SonoraError {
    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            SonoraError::Streaming(e) if e.is_client_error() => format!("Bad request: {e}"),
            SonoraError::Streaming(_) => "Streaming error occurred".to_string(),
            SonoraError::Storage(e) => format!("Media storage problem: {e}"),
            SonoraError::Manifest(e) => format!("Could not load catalog: {e}"),
            SonoraError::Account(e) => e.to_string(),
            SonoraError::Configuration { reason } => format!("Configuration error: {reason}"),
            SonoraError::Io(_) => "File system error occurred".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SonoraError>;
