//! Failure statuses and bodies of the stream endpoints

use axum::body::Body;
use axum::http::{HeaderValue, Request, StatusCode, header};

use super::support::{TestServer, body_json, header_str};

#[tokio::test]
async fn test_missing_range_for_every_combination() {
    let server = TestServer::new();

    for uri in [
        "/stream/long/u-flac",
        "/stream/nope/u-flac",
        "/stream/long/stranger",
        "/stream/android/nope/stranger",
    ] {
        let response = server.get(uri, None).await;
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE, "{uri}");
        assert_eq!(body_json(response).await["error"], "Requires range header");
    }

    assert_eq!(server.storage.size_calls(), 0);
}

#[tokio::test]
async fn test_malformed_ranges() {
    let server = TestServer::new();

    for range in ["bytes=abc-", "bytes=0-10,20-30", "bytes=-500", "items=0-", "bytes=50-10"] {
        let response = server.get("/stream/short/u-flac", Some(range)).await;
        assert_eq!(
            response.status(),
            StatusCode::RANGE_NOT_SATISFIABLE,
            "{range}"
        );
        assert!(response.headers().get(header::CONTENT_RANGE).is_none());
    }
    assert!(server.storage.opened_paths().is_empty());
}

#[tokio::test]
async fn test_unreadable_range_header_is_malformed() {
    let server = TestServer::new();
    let request = Request::get("/stream/long/u-flac")
        .header(header::RANGE, HeaderValue::from_bytes(b"bytes=\xff-").unwrap())
        .body(Body::empty())
        .unwrap();

    let response = server.send(request).await;

    assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    let error = body_json(response).await["error"].as_str().unwrap().to_string();
    assert!(error.starts_with("Malformed range header"), "{error}");
    assert_eq!(server.storage.size_calls(), 0);
}

#[tokio::test]
async fn test_bare_range_without_unit() {
    let server = TestServer::new();
    let response = server.get("/stream/short/u-flac", Some("40-")).await;

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header_str(&response, header::CONTENT_RANGE), "bytes 40-99/100");
}

#[tokio::test]
async fn test_unknown_song() {
    let server = TestServer::new();
    let response = server.get("/stream/nope/u-flac", Some("bytes=0-")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await["error"],
        "Requested song not found: nope"
    );
}

#[tokio::test]
async fn test_catalogued_file_missing_is_server_error() {
    let server = TestServer::new();

    for uri in ["/stream/drifted/u-opus", "/stream/android/drifted/u-flac"] {
        let response = server.get(uri, Some("bytes=0-")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "Storage unavailable");
    }

    let metadata = server.get("/api/songs/drifted", None).await;
    assert_eq!(metadata.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
