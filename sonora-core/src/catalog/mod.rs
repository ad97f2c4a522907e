//! Song catalog: assets, their stored encodings, and lookup contracts.
//!
//! Catalog records are produced by an ingestion path outside this crate and are
//! read-only here. Byte sizes are never recorded; they are measured from storage
//! whenever a request needs them.

pub mod integrity;
pub mod manifest;
pub mod memory;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use integrity::{IntegrityReport, MissingVariant, check_integrity};
pub use manifest::{CatalogManifest, ManifestError};
pub use memory::InMemoryCatalog;

use crate::streaming::{StreamingError, StreamingResult};

/// Encoding tier of a stored variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingTier {
    /// FLAC
    Lossless,
    /// Opus
    Lossy,
}

impl EncodingTier {
    /// MIME type reported for bytes of this tier.
    pub fn content_type(self) -> &'static str {
        match self {
            EncodingTier::Lossless => "audio/flac",
            EncodingTier::Lossy => "audio/opus",
        }
    }

    /// The other tier, used when the preferred one is not stored.
    pub fn alternate(self) -> Self {
        match self {
            EncodingTier::Lossless => EncodingTier::Lossy,
            EncodingTier::Lossy => EncodingTier::Lossless,
        }
    }
}

impl std::fmt::Display for EncodingTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodingTier::Lossless => write!(f, "lossless"),
            EncodingTier::Lossy => write!(f, "lossy"),
        }
    }
}

/// One physical encoding of an asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    /// Tier this encoding belongs to
    pub tier: EncodingTier,
    /// MIME type sent as Content-Type
    pub content_type: &'static str,
    /// Location relative to the media storage root
    pub storage_path: PathBuf,
}

impl Variant {
    /// Creates a variant whose content type follows from its tier.
    pub fn new(tier: EncodingTier, storage_path: impl Into<PathBuf>) -> Self {
        Self {
            tier,
            content_type: tier.content_type(),
            storage_path: storage_path.into(),
        }
    }
}

/// Stored variants of one asset, at most one per tier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantSet {
    lossless: Option<Variant>,
    lossy: Option<Variant>,
}

impl VariantSet {
    /// Builds a set from optional lossless and lossy storage paths.
    pub fn from_paths(lossless: Option<PathBuf>, lossy: Option<PathBuf>) -> Self {
        Self {
            lossless: lossless.map(|path| Variant::new(EncodingTier::Lossless, path)),
            lossy: lossy.map(|path| Variant::new(EncodingTier::Lossy, path)),
        }
    }

    /// Variant stored for `tier`, if any.
    pub fn get(&self, tier: EncodingTier) -> Option<&Variant> {
        match tier {
            EncodingTier::Lossless => self.lossless.as_ref(),
            EncodingTier::Lossy => self.lossy.as_ref(),
        }
    }

    /// All stored variants, lossless first.
    pub fn iter(&self) -> impl Iterator<Item = &Variant> {
        self.lossless.iter().chain(self.lossy.iter())
    }

    /// True when the asset has no stored encoding at all.
    pub fn is_empty(&self) -> bool {
        self.lossless.is_none() && self.lossy.is_none()
    }
}

/// Descriptive song metadata carried alongside the variants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongMetadata {
    pub title: String,
    /// Duration in seconds
    pub duration: u32,
    pub artist: String,
    #[serde(default)]
    pub featured_artist: Vec<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub release: Option<String>,
    #[serde(default)]
    pub play_count: u64,
    #[serde(default)]
    pub liked_by: Vec<String>,
    #[serde(default)]
    pub cover_art: Option<String>,
}

/// A logical media item: one song with its stored encodings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub id: String,
    pub metadata: SongMetadata,
    pub variants: VariantSet,
}

/// Read access to catalog records.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Looks up an asset by identifier. `None` means no record exists.
    async fn asset(&self, asset_id: &str) -> Option<Asset>;

    /// Every catalogued asset, in no particular order.
    async fn all_assets(&self) -> Vec<Asset>;
}

/// Resolves asset identifiers to their stored variants.
///
/// Does not touch storage: a catalogued variant whose file is gone surfaces
/// later as `StreamingError::StorageUnavailable`, not as `AssetNotFound`.
#[derive(Clone)]
pub struct AssetLocator {
    catalog: Arc<dyn CatalogStore>,
}

impl AssetLocator {
    /// Creates a locator backed by `catalog`.
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        Self { catalog }
    }

    /// Resolves the variant set of `asset_id`.
    ///
    /// # Errors
    /// - `StreamingError::AssetNotFound` - No catalog record for the identifier
    pub async fn resolve(&self, asset_id: &str) -> StreamingResult<VariantSet> {
        let asset = self
            .catalog
            .asset(asset_id)
            .await
            .ok_or_else(|| StreamingError::AssetNotFound {
                asset_id: asset_id.to_string(),
            })?;

        debug!(
            "Resolved {} to {} stored variant(s)",
            asset_id,
            asset.variants.iter().count()
        );

        Ok(asset.variants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(id: &str, variants: VariantSet) -> Asset {
        Asset {
            id: id.to_string(),
            metadata: SongMetadata {
                title: "Test Song".to_string(),
                ..Default::default()
            },
            variants,
        }
    }

    #[test]
    fn test_variant_content_type_follows_tier() {
        let lossless = Variant::new(EncodingTier::Lossless, "a.flac");
        let lossy = Variant::new(EncodingTier::Lossy, "a.opus");

        assert_eq!(lossless.content_type, "audio/flac");
        assert_eq!(lossy.content_type, "audio/opus");
        assert_eq!(EncodingTier::Lossless.alternate(), EncodingTier::Lossy);
    }

    #[test]
    fn test_variant_set_lookup() {
        let set = VariantSet::from_paths(None, Some(PathBuf::from("a.opus")));

        assert!(set.get(EncodingTier::Lossless).is_none());
        assert_eq!(
            set.get(EncodingTier::Lossy).map(|v| v.storage_path.clone()),
            Some(PathBuf::from("a.opus"))
        );
        assert_eq!(set.iter().count(), 1);
        assert!(!set.is_empty());
        assert!(VariantSet::default().is_empty());
    }

    #[tokio::test]
    async fn test_locator_resolves_known_asset() {
        let catalog = InMemoryCatalog::new();
        catalog.insert(asset(
            "song-1",
            VariantSet::from_paths(Some("a.flac".into()), Some("a.opus".into())),
        ));
        let locator = AssetLocator::new(Arc::new(catalog));

        let variants = locator.resolve("song-1").await.unwrap();
        assert_eq!(variants.iter().count(), 2);
    }

    #[tokio::test]
    async fn test_locator_reports_unknown_asset() {
        let locator = AssetLocator::new(Arc::new(InMemoryCatalog::new()));

        let result = locator.resolve("missing").await;
        assert!(matches!(
            result,
            Err(StreamingError::AssetNotFound { asset_id }) if asset_id == "missing"
        ));
    }

    #[tokio::test]
    async fn test_asset_without_variants_is_not_an_error() {
        let catalog = InMemoryCatalog::new();
        catalog.insert(asset("bare", VariantSet::default()));
        let locator = AssetLocator::new(Arc::new(catalog));

        let variants = locator.resolve("bare").await.unwrap();
        assert!(variants.is_empty());
    }
}
