//! 206 Partial Content response assembly.

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use super::StreamingResult;
use super::window::ByteWindow;
use crate::storage::MediaStorage;

/// Format of the Content-Range header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRangeShape {
    /// `bytes start-end/size`
    WithTotal,
    /// `bytes start-end`, for clients that never look at the total
    WithoutTotal,
}

impl ContentRangeShape {
    /// Renders the Content-Range value for `window`.
    ///
    /// # Examples
    /// ```
    /// use sonora_core::streaming::{ByteWindow, ContentRangeShape, WindowPolicy};
    ///
    /// let window = ByteWindow::compute(0, 2_500_000, WindowPolicy::BoundedChunk).unwrap();
    /// assert_eq!(ContentRangeShape::WithTotal.render(&window), "bytes 0-999999/2500000");
    /// assert_eq!(ContentRangeShape::WithoutTotal.render(&window), "bytes 0-999999");
    /// ```
    pub fn render(self, window: &ByteWindow) -> String {
        match self {
            ContentRangeShape::WithTotal => format!(
                "bytes {}-{}/{}",
                window.start(),
                window.end(),
                window.total_size()
            ),
            ContentRangeShape::WithoutTotal => {
                format!("bytes {}-{}", window.start(), window.end())
            }
        }
    }
}

/// Streams a byte window of a stored file as a partial-content response.
#[derive(Clone)]
pub struct PartialContentResponder {
    storage: Arc<dyn MediaStorage>,
}

impl PartialContentResponder {
    pub fn new(storage: Arc<dyn MediaStorage>) -> Self {
        Self { storage }
    }

    /// Opens `storage_path` at the window start and returns the 206 response
    /// whose body streams the window.
    ///
    /// The file is opened before any part of the response exists, so a missing
    /// file becomes an error instead of a truncated 206. The body reads lazily
    /// and holds the file handle until it completes or is dropped.
    ///
    /// # Errors
    /// - `StreamingError::StorageUnavailable` - File could not be opened or positioned
    pub async fn respond(
        &self,
        storage_path: &Path,
        window: &ByteWindow,
        content_type: &str,
        shape: ContentRangeShape,
    ) -> StreamingResult<Response> {
        let stream = self
            .storage
            .read_range(storage_path, window.start(), window.end())
            .await?;

        Ok(Response::builder()
            .status(StatusCode::PARTIAL_CONTENT)
            .header(header::CONTENT_RANGE, shape.render(window))
            .header(header::ACCEPT_RANGES, "bytes")
            .header(header::CONTENT_LENGTH, window.content_length().to_string())
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from_stream(stream))
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response()))
    }
}
