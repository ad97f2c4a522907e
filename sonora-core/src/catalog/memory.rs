//! In-memory catalog store

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{Asset, CatalogStore};

/// Catalog held entirely in memory, keyed by asset id.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    assets: RwLock<HashMap<String, Asset>>,
}

impl InMemoryCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an asset, returning the previous record.
    pub fn insert(&self, asset: Asset) -> Option<Asset> {
        self.assets.write().insert(asset.id.clone(), asset)
    }

    /// Number of catalogued assets
    pub fn len(&self) -> usize {
        self.assets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.read().is_empty()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn asset(&self, asset_id: &str) -> Option<Asset> {
        self.assets.read().get(asset_id).cloned()
    }

    async fn all_assets(&self) -> Vec<Asset> {
        self.assets.read().values().cloned().collect()
    }
}
