//! Mapping of domain failures to HTTP responses.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use sonora_core::AccountError;
use sonora_core::streaming::StreamingError;

/// Failure of an API request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Stream or catalog lookup failure
    #[error(transparent)]
    Streaming(#[from] StreamingError),

    /// Account update failure
    #[error(transparent)]
    Account(#[from] AccountError),

    /// Request body missing, not JSON, or not the expected shape
    #[error(transparent)]
    InvalidBody(#[from] JsonRejection),
}

impl ApiError {
    /// HTTP status reported for this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Streaming(e) => e.status_code(),
            ApiError::Account(AccountError::RequesterNotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::InvalidBody(rejection) => rejection.status(),
        }
    }

    fn reason(&self) -> String {
        match self {
            // Paths stay in the server log
            ApiError::Streaming(e) if e.is_storage_error() => "Storage unavailable".to_string(),
            ApiError::InvalidBody(rejection) => rejection.body_text(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let content_range = match &self {
            ApiError::Streaming(StreamingError::RangeNotSatisfiable { total_size, .. }) => {
                HeaderValue::from_str(&format!("bytes */{total_size}")).ok()
            }
            _ => None,
        };

        let mut response = (status, Json(json!({ "error": self.reason() }))).into_response();
        if let Some(value) = content_range {
            response.headers_mut().insert(header::CONTENT_RANGE, value);
        }
        response
    }
}
