//! Byte-range stream endpoints.
//!
//! Both routes share one engine and differ only in the stream profile.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use sonora_core::streaming::{StreamProfile, StreamRequest, extract_range_header};

use crate::error::ApiError;
use crate::server::AppState;

/// Progressive stream: one bounded chunk per request, total size reported.
///
/// # Errors
///
/// - `ApiError::Streaming` - Any engine failure, mapped to its status
pub async fn stream_song(
    State(state): State<AppState>,
    Path((song_id, user_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    serve(&state, &song_id, &user_id, &headers, StreamProfile::PROGRESSIVE).await
}

/// Continuous stream for mobile players: through end of file, no total size.
///
/// # Errors
///
/// - `ApiError::Streaming` - Any engine failure, mapped to its status
pub async fn stream_song_android(
    State(state): State<AppState>,
    Path((song_id, user_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    serve(&state, &song_id, &user_id, &headers, StreamProfile::CONTINUOUS).await
}

async fn serve(
    state: &AppState,
    song_id: &str,
    user_id: &str,
    headers: &HeaderMap,
    profile: StreamProfile,
) -> Result<Response, ApiError> {
    let request = StreamRequest {
        asset_id: song_id,
        requester_id: user_id,
        range_header: extract_range_header(headers)?,
    };

    Ok(state.engine.stream(&request, profile).await?)
}
