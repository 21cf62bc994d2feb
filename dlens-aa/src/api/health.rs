//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok", or "degraded" when the detection model is unavailable
    pub status: String,
    /// Module name ("dlens-aa")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Why the detector is unavailable, if it is
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detector_error: Option<String>,
}

/// GET /health
///
/// Reports "degraded" while still serving: analyses run with
/// error-carrying region records until a model is available.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let detector_error = state.detector.unavailable_reason().map(str::to_string);
    let status = if detector_error.is_none() {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        module: "dlens-aa".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        detector_error,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
