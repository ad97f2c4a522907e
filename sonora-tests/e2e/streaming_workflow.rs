//! Progressive and continuous streaming over HTTP

use std::path::PathBuf;

use axum::http::{StatusCode, header};
use futures::StreamExt;
use futures::future::join_all;
use sonora_core::storage::test_fixtures::patterned_bytes;

use super::support::{LONG_SONG_SIZE, TestServer, body_bytes, body_json, header_str};

#[tokio::test]
async fn test_progressive_first_chunk() {
    let server = TestServer::new();
    let response = server.get("/stream/long/u-flac", Some("bytes=0-")).await;

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        header_str(&response, header::CONTENT_RANGE),
        "bytes 0-999999/2500000"
    );
    assert_eq!(header_str(&response, header::CONTENT_LENGTH), "1000000");
    assert_eq!(header_str(&response, header::ACCEPT_RANGES), "bytes");
    assert_eq!(header_str(&response, header::CONTENT_TYPE), "audio/flac");

    let body = body_bytes(response).await;
    assert_eq!(body, patterned_bytes(LONG_SONG_SIZE)[..1_000_000]);
}

#[tokio::test]
async fn test_continuous_tail() {
    let server = TestServer::new();
    let response = server
        .get("/stream/android/long/u-flac", Some("bytes=2499000-"))
        .await;

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        header_str(&response, header::CONTENT_RANGE),
        "bytes 2499000-2499999"
    );
    assert_eq!(header_str(&response, header::CONTENT_LENGTH), "1000");

    let body = body_bytes(response).await;
    assert_eq!(body, patterned_bytes(LONG_SONG_SIZE)[2_499_000..]);
}

#[tokio::test]
async fn test_unknown_requester_streams_nothing() {
    let server = TestServer::new();
    let response = server.get("/stream/long/stranger", Some("bytes=0-")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().get(header::CONTENT_RANGE).is_none());
    assert!(server.storage.opened_paths().is_empty());
    assert_eq!(server.storage.size_calls(), 0);
}

#[tokio::test]
async fn test_start_at_size_not_satisfiable_in_both_modes() {
    let server = TestServer::new();

    for uri in ["/stream/short/u-flac", "/stream/android/short/u-flac"] {
        let response = server.get(uri, Some("bytes=100-")).await;
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(header_str(&response, header::CONTENT_RANGE), "bytes */100");
    }
    assert!(server.storage.opened_paths().is_empty());
}

#[tokio::test]
async fn test_chunks_reconstruct_whole_file() {
    let server = TestServer::new();

    let whole = body_bytes(
        server
            .get("/stream/android/long/u-flac", Some("bytes=0-"))
            .await,
    )
    .await;
    assert_eq!(whole.len(), LONG_SONG_SIZE);

    let mut assembled = Vec::with_capacity(LONG_SONG_SIZE);
    let mut start = 0usize;
    let mut requests = 0;
    while start < LONG_SONG_SIZE {
        let response = server
            .get("/stream/long/u-flac", Some(format!("bytes={start}-").as_str()))
            .await;
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        let chunk = body_bytes(response).await;
        assert!(!chunk.is_empty());
        start += chunk.len();
        assembled.extend_from_slice(&chunk);
        requests += 1;
    }

    assert_eq!(requests, 3);
    assert_eq!(assembled, whole);
    assert_eq!(assembled, patterned_bytes(LONG_SONG_SIZE));
}

#[tokio::test]
async fn test_explicit_end_narrows_window() {
    let server = TestServer::new();
    let response = server.get("/stream/short/u-flac", Some("bytes=10-19")).await;

    assert_eq!(header_str(&response, header::CONTENT_RANGE), "bytes 10-19/100");
    assert_eq!(header_str(&response, header::CONTENT_LENGTH), "10");
    assert_eq!(body_bytes(response).await, patterned_bytes(100)[10..20]);
}

#[tokio::test]
async fn test_preference_picks_encoding() {
    let server = TestServer::new();

    let lossy = server.get("/stream/long/u-opus", Some("bytes=0-")).await;
    assert_eq!(header_str(&lossy, header::CONTENT_TYPE), "audio/opus");
    assert_eq!(
        header_str(&lossy, header::CONTENT_RANGE),
        "bytes 0-624999/625000"
    );

    // short has no lossy encoding
    let fallback = server.get("/stream/short/u-opus", Some("bytes=0-")).await;
    assert_eq!(fallback.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header_str(&fallback, header::CONTENT_TYPE), "audio/flac");

    assert_eq!(
        server.storage.opened_paths(),
        vec![
            PathBuf::from("opus/long.opus"),
            PathBuf::from("flac/short.flac")
        ]
    );
}

#[tokio::test]
async fn test_song_without_encodings() {
    let server = TestServer::new();
    let response = server.get("/stream/unencoded/u-flac", Some("bytes=0-")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await["error"],
        "No stored encoding for requested song"
    );
}

#[tokio::test]
async fn test_client_disconnect_mid_stream() {
    let server = TestServer::new();
    let response = server
        .get("/stream/android/long/u-flac", Some("bytes=0-"))
        .await;
    assert_eq!(server.storage.open_streams(), 1);

    let mut body = response.into_body().into_data_stream();
    let first = body.next().await.unwrap().unwrap();
    assert!(!first.is_empty());
    assert_eq!(server.storage.released_count(), 0);

    drop(body);
    assert_eq!(server.storage.released_count(), 1);
    assert_eq!(server.storage.open_streams(), 0);
}

#[tokio::test]
async fn test_completed_streams_release_their_files() {
    let server = TestServer::new();

    for range in ["bytes=0-", "bytes=1000000-", "bytes=2000000-"] {
        let response = server.get("/stream/long/u-flac", Some(range)).await;
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        body_bytes(response).await;
    }

    assert_eq!(server.storage.opened_paths().len(), 3);
    assert_eq!(server.storage.open_streams(), 0);
}

#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let server = TestServer::new();
    let expected = patterned_bytes(LONG_SONG_SIZE);

    let starts = [0usize, 1_000_000, 2_000_000, 2_400_000];
    let responses = join_all(starts.iter().map(|start| {
        let range = format!("bytes={start}-");
        let server = &server;
        async move { server.get("/stream/long/u-flac", Some(range.as_str())).await }
    }))
    .await;

    for (start, response) in starts.iter().zip(responses) {
        let end = (start + 1_000_000).min(LONG_SONG_SIZE);
        assert_eq!(body_bytes(response).await, expected[*start..end]);
    }
}
