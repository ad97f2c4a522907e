//! Preference changes and song metadata over HTTP

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::json;

use super::support::{LONG_SONG_SIZE, SHORT_SONG_SIZE, TestServer, body_json, header_str};

fn preference_request(user_id: &str, preference: &str) -> Request<Body> {
    Request::builder()
        .method(Method::PATCH)
        .uri(format!("/api/users/{user_id}/preference"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "preference": preference }).to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_preference_change_applies_to_next_request() {
    let server = TestServer::new();

    let before = server.get("/stream/long/u-flac", Some("bytes=0-")).await;
    assert_eq!(header_str(&before, header::CONTENT_TYPE), "audio/flac");

    let update = server.send(preference_request("u-flac", "opus")).await;
    assert_eq!(update.status(), StatusCode::NO_CONTENT);

    let after = server.get("/stream/long/u-flac", Some("bytes=0-")).await;
    assert_eq!(header_str(&after, header::CONTENT_TYPE), "audio/opus");

    let update = server.send(preference_request("u-flac", "lossless")).await;
    assert_eq!(update.status(), StatusCode::NO_CONTENT);
    let restored = server.get("/stream/long/u-flac", Some("bytes=0-")).await;
    assert_eq!(header_str(&restored, header::CONTENT_TYPE), "audio/flac");
}

#[tokio::test]
async fn test_preference_change_for_unknown_user() {
    let server = TestServer::new();
    let response = server.send(preference_request("stranger", "flac")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await["error"],
        "Requester not found: stranger"
    );
}

#[tokio::test]
async fn test_invalid_preference_rejected() {
    let server = TestServer::new();
    let response = server.send(preference_request("u-flac", "mp3")).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        header_str(&response, header::CONTENT_TYPE),
        "application/json"
    );
    let error = body_json(response).await["error"].as_str().unwrap().to_string();
    assert!(error.contains("mp3"), "{error}");

    // Stored preference untouched
    let stream = server.get("/stream/long/u-flac", Some("bytes=0-")).await;
    assert_eq!(header_str(&stream, header::CONTENT_TYPE), "audio/flac");
}

#[tokio::test]
async fn test_preference_body_must_be_json() {
    let server = TestServer::new();
    let request = Request::builder()
        .method(Method::PATCH)
        .uri("/api/users/u-flac/preference")
        .body(Body::from("preference=opus"))
        .unwrap();

    let response = server.send(request).await;

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn test_song_metadata_reports_current_sizes() {
    let server = TestServer::new();
    let response = server.get("/api/songs/long", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], "long");
    assert_eq!(body["title"], "Long Song");
    assert_eq!(body["featured_artist"], json!(["a2"]));
    assert_eq!(body["like_count"], 1);
    assert_eq!(body["play_count"], 7);
    assert_eq!(body["song_size"], LONG_SONG_SIZE);
    assert_eq!(body["song_size_lossy"], LONG_SONG_SIZE / 4);
}

#[tokio::test]
async fn test_song_metadata_absent_encoding_is_null() {
    let server = TestServer::new();
    let body = body_json(server.get("/api/songs/short", None).await).await;

    assert_eq!(body["song_size"], SHORT_SONG_SIZE);
    assert!(body["song_size_lossy"].is_null());
    assert!(body["genre"].is_null());
}

#[tokio::test]
async fn test_health_reports_start_time() {
    let server = TestServer::new();
    let response = server.get("/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert!(body["started_at"].as_str().unwrap().contains('T'));
}
