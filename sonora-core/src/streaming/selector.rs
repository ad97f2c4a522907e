//! Format selection between stored encodings of an asset.

use std::sync::Arc;

use tracing::debug;

use super::{StreamingError, StreamingResult};
use crate::accounts::{AccountStore, FormatPreference};
use crate::catalog::{Variant, VariantSet};

/// Picks the encoding to stream from the requester's stored preference.
///
/// The preference is read from the account store on every call.
#[derive(Clone)]
pub struct FormatSelector {
    accounts: Arc<dyn AccountStore>,
}

impl FormatSelector {
    pub fn new(accounts: Arc<dyn AccountStore>) -> Self {
        Self { accounts }
    }

    /// Current stored preference of `requester_id`.
    ///
    /// # Errors
    /// - `StreamingError::RequesterNotFound` - No account with this id
    pub async fn preference_for(&self, requester_id: &str) -> StreamingResult<FormatPreference> {
        self.accounts
            .preference(requester_id)
            .await
            .ok_or_else(|| StreamingError::RequesterNotFound {
                requester_id: requester_id.to_string(),
            })
    }

    /// Chooses the variant matching `preference`, falling back to the other
    /// tier when the preferred one is not stored.
    ///
    /// # Errors
    /// - `StreamingError::NoMatchingVariant` - The set holds no variant at all
    pub fn choose(preference: FormatPreference, variants: &VariantSet) -> StreamingResult<Variant> {
        let preferred = preference.preferred_tier();
        if let Some(variant) = variants.get(preferred) {
            return Ok(variant.clone());
        }

        let fallback = variants
            .get(preferred.alternate())
            .ok_or(StreamingError::NoMatchingVariant)?;
        debug!(
            "No {} encoding stored, falling back to {}",
            preferred, fallback.tier
        );
        Ok(fallback.clone())
    }
}
