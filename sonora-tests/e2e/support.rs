//! Shared server fixture for end-to-end tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, header};
use axum::response::Response;
use sonora_core::catalog::CatalogManifest;
use sonora_core::storage::LocalMediaStorage;
use sonora_core::storage::test_fixtures::{RecordingStorage, create_media_library};
use sonora_web::{AppState, build_router};
use tempfile::TempDir;
use tower::ServiceExt;

pub const LONG_SONG_SIZE: usize = 2_500_000;
pub const SHORT_SONG_SIZE: usize = 100;

const MANIFEST: &str = r#"{
  "songs": [
    { "id": "long", "title": "Long Song", "duration": 320, "artist": "a1",
      "featured_artist": ["a2"], "genre": "ambient", "album": "al1",
      "release": "2021-04-01", "play_count": 7, "liked_by": ["u-flac"],
      "cover_art": "covers/al1.jpg",
      "file_path": "flac/long.flac", "file_path_lossy": "opus/long.opus" },
    { "id": "short", "title": "Short Song", "duration": 3, "artist": "a1",
      "file_path": "flac/short.flac" },
    { "id": "drifted", "title": "Deleted From Disk", "duration": 60, "artist": "a3",
      "file_path_lossy": "opus/drifted.opus" },
    { "id": "unencoded", "title": "Never Encoded", "duration": 60, "artist": "a3" }
  ],
  "users": [
    { "id": "u-flac", "preference": "flac" },
    { "id": "u-opus", "preference": "opus" }
  ]
}"#;

/// Server over a temporary media root.
pub struct TestServer {
    _library: TempDir,
    pub app: Router,
    pub storage: Arc<RecordingStorage>,
}

impl TestServer {
    pub fn new() -> Self {
        let library = create_media_library(&[
            ("flac/long.flac", LONG_SONG_SIZE),
            ("opus/long.opus", LONG_SONG_SIZE / 4),
            ("flac/short.flac", SHORT_SONG_SIZE),
        ]);

        let (catalog, accounts) = CatalogManifest::from_json(MANIFEST)
            .unwrap()
            .into_stores()
            .unwrap();
        let storage = Arc::new(RecordingStorage::new(Arc::new(LocalMediaStorage::new(
            library.path(),
            64 * 1024,
        ))));

        let state = AppState::new(Arc::new(catalog), Arc::new(accounts), storage.clone());

        Self {
            _library: library,
            app: build_router(state),
            storage,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, range: Option<&str>) -> Response {
        let mut request = Request::get(uri);
        if let Some(range) = range {
            request = request.header(header::RANGE, range);
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }
}

pub fn header_str<'a>(response: &'a Response, name: header::HeaderName) -> &'a str {
    response.headers().get(name).unwrap().to_str().unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
