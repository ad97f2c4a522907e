//! Song metadata endpoint.

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;
use sonora_core::catalog::{CatalogStore, EncodingTier, SongMetadata, VariantSet};
use sonora_core::storage::MediaStorage;
use sonora_core::streaming::{StreamingError, StreamingResult};
use tracing::error;

use crate::error::ApiError;
use crate::server::AppState;

/// Song metadata with the current size of each stored encoding.
#[derive(Debug, Serialize)]
pub struct SongDetails {
    /// Song identifier
    pub id: String,
    /// Song title
    pub title: String,
    /// Duration in seconds
    pub duration: u32,
    /// Main artist
    pub artist: String,
    /// Featured artists
    pub featured_artist: Vec<String>,
    /// Genre, if tagged
    pub genre: Option<String>,
    /// Album, if any
    pub album: Option<String>,
    /// Release date as stored
    pub release: Option<String>,
    /// Times played
    pub play_count: u64,
    /// Number of users who liked the song
    pub like_count: usize,
    /// Cover art location
    pub cover_art: Option<String>,
    /// Lossless size in bytes, `null` when not stored
    pub song_size: Option<u64>,
    /// Lossy size in bytes, `null` when not stored
    pub song_size_lossy: Option<u64>,
}

impl SongDetails {
    fn new(
        id: String,
        metadata: SongMetadata,
        song_size: Option<u64>,
        song_size_lossy: Option<u64>,
    ) -> Self {
        Self {
            id,
            like_count: metadata.liked_by.len(),
            title: metadata.title,
            duration: metadata.duration,
            artist: metadata.artist,
            featured_artist: metadata.featured_artist,
            genre: metadata.genre,
            album: metadata.album,
            release: metadata.release,
            play_count: metadata.play_count,
            cover_art: metadata.cover_art,
            song_size,
            song_size_lossy,
        }
    }
}

/// Returns metadata and current encoding sizes of one song.
///
/// # Errors
///
/// - `StreamingError::AssetNotFound` - Unknown song (404)
/// - `StreamingError::StorageUnavailable` - A catalogued encoding is missing (500)
pub async fn song_details(
    State(state): State<AppState>,
    Path(song_id): Path<String>,
) -> Result<Json<SongDetails>, ApiError> {
    let asset = state
        .catalog
        .asset(&song_id)
        .await
        .ok_or_else(|| StreamingError::AssetNotFound {
            asset_id: song_id.clone(),
        })?;

    let storage = state.storage.as_ref();
    let song_size = measure(storage, &asset.id, &asset.variants, EncodingTier::Lossless).await?;
    let song_size_lossy = measure(storage, &asset.id, &asset.variants, EncodingTier::Lossy).await?;

    Ok(Json(SongDetails::new(
        asset.id,
        asset.metadata,
        song_size,
        song_size_lossy,
    )))
}

async fn measure(
    storage: &dyn MediaStorage,
    song_id: &str,
    variants: &VariantSet,
    tier: EncodingTier,
) -> StreamingResult<Option<u64>> {
    let Some(variant) = variants.get(tier) else {
        return Ok(None);
    };

    match storage.size_of(&variant.storage_path).await {
        Ok(size) => Ok(Some(size)),
        Err(e) => {
            error!(
                "Catalog and storage out of sync for song {} ({}): {}",
                song_id, tier, e
            );
            Err(e.into())
        }
    }
}
