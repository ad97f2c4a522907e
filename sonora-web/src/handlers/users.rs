//! Requester account endpoints.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use sonora_core::{AccountStore, FormatPreference};
use tracing::info;

use crate::error::ApiError;
use crate::server::AppState;

/// Request body of a preference change.
#[derive(Debug, Deserialize)]
pub struct PreferenceUpdate {
    /// New preference: `flac`/`lossless` or `opus`/`lossy`
    pub preference: FormatPreference,
}

/// Stores a new format preference for `user_id`.
///
/// The next stream request from this user already sees the new value.
///
/// # Errors
///
/// - `AccountError::RequesterNotFound` - Unknown user (404)
/// - `ApiError::InvalidBody` - Body is not a valid preference update (4xx)
pub async fn update_preference(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    body: Result<Json<PreferenceUpdate>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(update) = body?;
    state
        .accounts
        .set_preference(&user_id, update.preference)
        .await?;

    info!("User {} now prefers {}", user_id, update.preference);
    Ok(StatusCode::NO_CONTENT)
}
