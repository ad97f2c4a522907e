//! Catalog against storage consistency check.

use std::path::PathBuf;

use tracing::{debug, warn};

use super::{CatalogStore, EncodingTier};
use crate::storage::{MediaStorage, StorageError};

/// A catalogued variant whose bytes storage cannot provide.
#[derive(Debug)]
pub struct MissingVariant {
    pub asset_id: String,
    pub tier: EncodingTier,
    pub storage_path: PathBuf,
    pub error: StorageError,
}

/// Outcome of checking every catalogued variant.
#[derive(Debug, Default)]
pub struct IntegrityReport {
    /// Variants whose size could be measured
    pub verified: usize,
    /// Assets without any stored encoding
    pub without_variants: Vec<String>,
    /// Variants storage could not provide
    pub missing: Vec<MissingVariant>,
}

impl IntegrityReport {
    /// True when every catalogued variant is present in storage.
    pub fn is_consistent(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Measures every catalogued variant through `storage`.
///
/// Assets are checked in identifier order so reports are stable.
pub async fn check_integrity(
    catalog: &dyn CatalogStore,
    storage: &dyn MediaStorage,
) -> IntegrityReport {
    let mut assets = catalog.all_assets().await;
    assets.sort_by(|a, b| a.id.cmp(&b.id));

    let mut report = IntegrityReport::default();
    for asset in assets {
        if asset.variants.is_empty() {
            report.without_variants.push(asset.id.clone());
            continue;
        }

        for variant in asset.variants.iter() {
            match storage.size_of(&variant.storage_path).await {
                Ok(size) => {
                    debug!(
                        "{} {} encoding present ({} bytes)",
                        asset.id, variant.tier, size
                    );
                    report.verified += 1;
                }
                Err(error) => {
                    warn!("{} {} encoding unavailable: {}", asset.id, variant.tier, error);
                    report.missing.push(MissingVariant {
                        asset_id: asset.id.clone(),
                        tier: variant.tier,
                        storage_path: variant.storage_path.clone(),
                        error,
                    });
                }
            }
        }
    }

    report
}
