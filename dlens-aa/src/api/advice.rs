//! Explicit advice save endpoint
//!
//! Overwrites the user's cached advice document with caller-supplied text,
//! bypassing generation. The next `/result` read returns this text verbatim.

use crate::api::sanitize_user_id;
use crate::{ApiError, ApiResult, AppState};
use axum::extract::State;
use axum::{routing::post, Json, Router};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SaveAdviceRequest {
    pub user_id: String,
    pub advice: String,
}

#[derive(Debug, Serialize)]
pub struct SaveAdviceResponse {
    pub success: bool,
}

/// POST /save-advice
pub async fn save_advice(
    State(state): State<AppState>,
    Json(payload): Json<SaveAdviceRequest>,
) -> ApiResult<Json<SaveAdviceResponse>> {
    if payload.user_id.trim().is_empty() {
        return Err(ApiError::BadRequest("Missing user_id".to_string()));
    }
    let user_id = sanitize_user_id(&payload.user_id);

    state
        .advice
        .save(&user_id, &payload.advice)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(SaveAdviceResponse { success: true }))
}

/// Build advice routes
pub fn advice_routes() -> Router<AppState> {
    Router::new().route("/save-advice", post(save_advice))
}
