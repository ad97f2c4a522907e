//! Axum server for the Sonora streaming API
//!
//! Loads the catalog manifest, wires the streaming engine to local media
//! storage and serves the HTTP routes.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch};
use chrono::{DateTime, Utc};
use sonora_core::catalog::{CatalogManifest, CatalogStore};
use sonora_core::storage::{LocalMediaStorage, MediaStorage};
use sonora_core::{AccountStore, SonoraConfig, SonoraError, StreamingEngine};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers::{
    health, song_details, stream_song, stream_song_android, update_preference,
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Stream request pipeline
    pub engine: StreamingEngine,
    /// Song records
    pub catalog: Arc<dyn CatalogStore>,
    /// Requester accounts
    pub accounts: Arc<dyn AccountStore>,
    /// Media bytes
    pub storage: Arc<dyn MediaStorage>,
    /// When this state was created
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Builds state and the streaming engine over the given collaborators.
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        accounts: Arc<dyn AccountStore>,
        storage: Arc<dyn MediaStorage>,
    ) -> Self {
        Self {
            engine: StreamingEngine::new(catalog.clone(), accounts.clone(), storage.clone()),
            catalog,
            accounts,
            storage,
            started_at: Utc::now(),
        }
    }
}

/// Builds the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Streaming endpoints
        .route("/stream/{song_id}/{user_id}", get(stream_song))
        .route(
            "/stream/android/{song_id}/{user_id}",
            get(stream_song_android),
        )
        // JSON API endpoints
        .route("/api/songs/{song_id}", get(song_details))
        .route("/api/users/{user_id}/preference", patch(update_preference))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Loads the configured catalog and serves until the listener fails.
///
/// # Errors
///
/// - `SonoraError::Configuration` - No catalog manifest configured
/// - `SonoraError::Manifest` - Manifest could not be loaded
/// - `SonoraError::Io` - Address could not be bound or the server failed
pub async fn run_server(config: SonoraConfig) -> sonora_core::Result<()> {
    let catalog_path =
        config
            .storage
            .catalog_path
            .as_deref()
            .ok_or_else(|| SonoraError::Configuration {
                reason: "no catalog manifest configured (set SONORA_CATALOG or --catalog)"
                    .to_string(),
            })?;

    let manifest = CatalogManifest::load(catalog_path).await?;
    let (catalog, accounts) = manifest.into_stores()?;
    info!(
        "Catalog loaded: {} songs, {} users",
        catalog.len(),
        accounts.len()
    );

    let storage = LocalMediaStorage::new(
        config.storage.media_root.clone(),
        config.storage.read_buffer_size,
    );
    info!("Serving media from {}", storage.root().display());

    let state = AppState::new(Arc::new(catalog), Arc::new(accounts), Arc::new(storage));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.server.bind_addr).await?;
    info!("Sonora streaming server running on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode, header};
    use sonora_core::catalog::{Asset, InMemoryCatalog, SongMetadata, VariantSet};
    use sonora_core::storage::test_fixtures::create_media_library;
    use sonora_core::{FormatPreference, InMemoryAccountStore};
    use tower::ServiceExt;

    use super::*;

    fn test_state(library: &tempfile::TempDir) -> AppState {
        let catalog = InMemoryCatalog::new();
        catalog.insert(Asset {
            id: "s1".to_string(),
            metadata: SongMetadata {
                title: "First".to_string(),
                duration: 180,
                artist: "a1".to_string(),
                liked_by: vec!["u1".to_string(), "u2".to_string()],
                ..Default::default()
            },
            variants: VariantSet::from_paths(None, Some("s1.opus".into())),
        });
        catalog.insert(Asset {
            id: "drifted".to_string(),
            metadata: SongMetadata::default(),
            variants: VariantSet::from_paths(Some("gone.flac".into()), None),
        });

        let accounts = InMemoryAccountStore::new();
        accounts.insert("u1", FormatPreference::Lossless);

        AppState::new(
            Arc::new(catalog),
            Arc::new(accounts),
            Arc::new(LocalMediaStorage::new(library.path(), 4096)),
        )
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let library = create_media_library(&[]);
        let state = test_state(&library);
        let started_at = state.started_at.to_rfc3339();

        let response = build_router(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["started_at"], started_at);
    }

    #[tokio::test]
    async fn test_song_details() {
        let library = create_media_library(&[("s1.opus", 1234)]);
        let response = build_router(test_state(&library))
            .oneshot(Request::get("/api/songs/s1").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["title"], "First");
        assert_eq!(body["like_count"], 2);
        assert_eq!(body["song_size"], serde_json::Value::Null);
        assert_eq!(body["song_size_lossy"], 1234);
    }

    #[tokio::test]
    async fn test_song_details_errors() {
        let library = create_media_library(&[]);
        let app = build_router(test_state(&library));

        let unknown = app
            .clone()
            .oneshot(Request::get("/api/songs/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

        let drifted = app
            .oneshot(Request::get("/api/songs/drifted").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(drifted.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_update_preference() {
        let library = create_media_library(&[]);
        let app = build_router(test_state(&library));

        let patch_request = |user: &str, body: &'static str| {
            Request::builder()
                .method(Method::PATCH)
                .uri(format!("/api/users/{user}/preference"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap()
        };

        let ok = app
            .clone()
            .oneshot(patch_request("u1", r#"{"preference":"opus"}"#))
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::NO_CONTENT);

        let unknown = app
            .clone()
            .oneshot(patch_request("u9", r#"{"preference":"flac"}"#))
            .await
            .unwrap();
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

        let invalid = app
            .oneshot(patch_request("u1", r#"{"preference":"wav"}"#))
            .await
            .unwrap();
        assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let error = json_body(invalid).await["error"].as_str().unwrap().to_string();
        assert!(error.contains("wav"), "{error}");
    }

    #[tokio::test]
    async fn test_stream_requires_range() {
        let library = create_media_library(&[("s1.opus", 100)]);
        let response = build_router(test_state(&library))
            .oneshot(Request::get("/stream/s1/u1").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(json_body(response).await["error"], "Requires range header");
    }
}
