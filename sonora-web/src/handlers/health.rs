//! Liveness endpoint.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::server::AppState;

/// Server liveness report.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// Always `"ok"` while the server answers
    pub status: &'static str,
    /// Server start time, RFC 3339
    pub started_at: String,
}

/// Reports that the server is up and when it started.
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        started_at: state.started_at.to_rfc3339(),
    })
}
