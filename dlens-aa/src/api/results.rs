//! Result retrieval endpoint
//!
//! Returns the user's current snapshot together with the advice document,
//! generating and caching the advice on first read (see `advice`).

use crate::advice::AdviceError;
use crate::api::sanitize_user_id;
use crate::{ApiError, ApiResult, AppState};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct ResultQuery {
    pub user_id: Option<String>,
}

/// GET /result?user_id=
pub async fn get_result(
    State(state): State<AppState>,
    Query(query): Query<ResultQuery>,
) -> ApiResult<Response> {
    let user_id = query
        .user_id
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing user_id".to_string()))?;
    let user_id = sanitize_user_id(&user_id);

    match state.advice.results_with_advice(&user_id).await {
        Ok((results, advice)) => Ok(Json(json!({
            "results": results,
            "advice": advice,
        }))
        .into_response()),
        Err(AdviceError::NoResults(_)) => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "No analysis results found",
                "results": [],
                "advice": "",
            })),
        )
            .into_response()),
        Err(AdviceError::Storage(e)) => Err(ApiError::Internal(e.to_string())),
    }
}

/// Build result routes
pub fn result_routes() -> Router<AppState> {
    Router::new().route("/result", get(get_result))
}
