//! Stream request orchestration.
//!
//! One engine serves both client profiles; they differ only in window policy
//! and Content-Range shape. The engine holds no per-asset state: every request
//! re-reads the preference, re-resolves the variant and re-measures the file.

use std::sync::Arc;

use axum::response::Response;
use tracing::{debug, error, info};

use super::range::parse_range_header;
use super::responder::{ContentRangeShape, PartialContentResponder};
use super::selector::FormatSelector;
use super::window::{ByteWindow, WindowPolicy};
use super::{StreamingError, StreamingResult};
use crate::accounts::AccountStore;
use crate::catalog::{AssetLocator, CatalogStore};
use crate::storage::MediaStorage;

/// Windowing and header behavior expected by a class of client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamProfile {
    pub policy: WindowPolicy,
    pub shape: ContentRangeShape,
}

impl StreamProfile {
    /// Desktop/web players that fetch the file chunk by chunk.
    pub const PROGRESSIVE: Self = Self {
        policy: WindowPolicy::BoundedChunk,
        shape: ContentRangeShape::WithTotal,
    };

    /// Mobile players that buffer one long response through end of file.
    pub const CONTINUOUS: Self = Self {
        policy: WindowPolicy::ToEnd,
        shape: ContentRangeShape::WithoutTotal,
    };
}

/// Inbound stream request.
#[derive(Debug, Clone, Copy)]
pub struct StreamRequest<'a> {
    pub asset_id: &'a str,
    pub requester_id: &'a str,
    /// Raw Range header value, if the client sent one
    pub range_header: Option<&'a str>,
}

/// Answers stream requests with partial-content responses.
#[derive(Clone)]
pub struct StreamingEngine {
    locator: AssetLocator,
    selector: FormatSelector,
    storage: Arc<dyn MediaStorage>,
    responder: PartialContentResponder,
}

impl StreamingEngine {
    /// Creates an engine over the given collaborators.
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        accounts: Arc<dyn AccountStore>,
        storage: Arc<dyn MediaStorage>,
    ) -> Self {
        Self {
            locator: AssetLocator::new(catalog),
            selector: FormatSelector::new(accounts),
            responder: PartialContentResponder::new(storage.clone()),
            storage,
        }
    }

    /// Serves one stream request under `profile`.
    ///
    /// The Range header is validated before any store is consulted, and no
    /// file is opened until the window is known to be satisfiable.
    ///
    /// # Errors
    /// - `StreamingError::MissingRange` - No Range header
    /// - `StreamingError::MalformedRange` - Range header could not be parsed
    /// - `StreamingError::RequesterNotFound` - Unknown requester
    /// - `StreamingError::AssetNotFound` - Unknown asset
    /// - `StreamingError::NoMatchingVariant` - Asset has no stored encoding
    /// - `StreamingError::RangeNotSatisfiable` - Range starts past the end of the file
    /// - `StreamingError::StorageUnavailable` - Catalogued file cannot be measured or opened
    pub async fn stream(
        &self,
        request: &StreamRequest<'_>,
        profile: StreamProfile,
    ) -> StreamingResult<Response> {
        let range = parse_range_header(request.range_header)?;

        let preference = self.selector.preference_for(request.requester_id).await?;
        let variants = self.locator.resolve(request.asset_id).await?;
        let variant = FormatSelector::choose(preference, &variants)?;

        debug!(
            "Selected {} encoding of {} for {} (prefers {})",
            variant.tier, request.asset_id, request.requester_id, preference
        );

        let total_size = self
            .storage
            .size_of(&variant.storage_path)
            .await
            .map_err(StreamingError::from)
            .inspect_err(|e| report_storage_drift(request, e))?;

        let window = ByteWindow::for_request(&range, total_size, profile.policy)?;

        info!(
            "Streaming {} bytes {}-{}/{} of {} ({}) via {}",
            window.content_length(),
            window.start(),
            window.end(),
            total_size,
            request.asset_id,
            variant.content_type,
            self.storage.storage_type()
        );

        self.responder
            .respond(
                &variant.storage_path,
                &window,
                variant.content_type,
                profile.shape,
            )
            .await
            .inspect_err(|e| report_storage_drift(request, e))
    }
}

fn report_storage_drift(request: &StreamRequest<'_>, e: &StreamingError) {
    error!(
        "Catalog and storage out of sync for song {}: {}",
        request.asset_id, e
    );
}
