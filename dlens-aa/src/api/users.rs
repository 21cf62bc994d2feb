//! User existence check endpoint

use crate::db::folders;
use crate::{ApiError, ApiResult, AppState};
use axum::extract::{Query, State};
use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CheckUserQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckUserResponse {
    pub exists: bool,
}

/// GET /check-user-id?user_id=
pub async fn check_user_id(
    State(state): State<AppState>,
    Query(query): Query<CheckUserQuery>,
) -> ApiResult<Json<CheckUserResponse>> {
    let user_id = query
        .user_id
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing user_id".to_string()))?;

    let exists = folders::user_exists(&state.db, &user_id).await?;
    Ok(Json(CheckUserResponse { exists }))
}

/// Build user routes
pub fn user_routes() -> Router<AppState> {
    Router::new().route("/check-user-id", get(check_user_id))
}
