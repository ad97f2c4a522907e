//! Byte-range audio streaming engine.
//!
//! A stream request flows through five steps: the Range header is parsed, the
//! requester's format preference picks one stored encoding of the asset, the
//! encoding's current size is measured, a window policy fixes the byte window,
//! and the window is streamed from storage as a 206 response.

pub mod engine;
pub mod range;
pub mod responder;
pub mod selector;
pub mod window;

use axum::http::StatusCode;

pub use engine::{StreamProfile, StreamRequest, StreamingEngine};
pub use range::{RangeRequest, extract_range_header, parse_range_header};
pub use responder::{ContentRangeShape, PartialContentResponder};
pub use selector::FormatSelector;
pub use window::{ByteWindow, CHUNK_SIZE, WindowPolicy};

use crate::storage::StorageError;

/// Failures of a single stream request.
///
/// Each variant maps to exactly one HTTP status via [`StreamingError::status_code`].
#[derive(Debug, thiserror::Error)]
pub enum StreamingError {
    /// Request carried no Range header
    #[error("Requires range header")]
    MissingRange,

    /// Range header could not be interpreted
    #[error("Malformed range header: {value}")]
    MalformedRange {
        /// The header value as received
        value: String,
    },

    /// Range starts at or beyond the end of the file
    #[error("Range starting at byte {start} not satisfiable for {total_size} bytes")]
    RangeNotSatisfiable {
        /// Requested first byte
        start: u64,
        /// Current size of the selected file
        total_size: u64,
    },

    /// No catalog record for the asset
    #[error("Requested song not found: {asset_id}")]
    AssetNotFound {
        /// Identifier that was looked up
        asset_id: String,
    },

    /// No account for the requester
    #[error("User not found: {requester_id}")]
    RequesterNotFound {
        /// Identifier that was looked up
        requester_id: String,
    },

    /// The asset exists but has no stored encoding in any tier
    #[error("No stored encoding for requested song")]
    NoMatchingVariant,

    /// Catalog names a file that storage cannot provide
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),
}

impl StreamingError {
    /// HTTP status reported for this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            StreamingError::MissingRange
            | StreamingError::MalformedRange { .. }
            | StreamingError::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            StreamingError::AssetNotFound { .. }
            | StreamingError::RequesterNotFound { .. }
            | StreamingError::NoMatchingVariant => StatusCode::NOT_FOUND,
            StreamingError::StorageUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Checks if this error is due to the client's range input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StreamingError::MissingRange
                | StreamingError::MalformedRange { .. }
                | StreamingError::RangeNotSatisfiable { .. }
        )
    }

    /// Checks if this error means catalog and storage have drifted apart.
    pub fn is_storage_error(&self) -> bool {
        matches!(self, StreamingError::StorageUnavailable(_))
    }
}

/// Result type for streaming operations
pub type StreamingResult<T> = Result<T, StreamingError>;
