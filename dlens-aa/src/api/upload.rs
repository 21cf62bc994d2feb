//! Upload endpoint
//!
//! Accepts one multipart request per batch: a `user_id` text field and one
//! file part per region (`left`, `middle`, `right`). The batch coordinator
//! validates the full set before any analysis runs, so a missing or
//! disallowed part rejects the request with nothing persisted.

use crate::analysis::BatchError;
use crate::analysis::RegionUpload;
use crate::api::sanitize_user_id;
use crate::models::{Region, RegionSummary};
use crate::{ApiError, ApiResult, AppState};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::{routing::post, Json, Router};
use serde::Serialize;
use tracing::info;

/// Maximum accepted request body (three photos plus form overhead)
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Upload response: reduced per-region summaries
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub user_id: String,
    pub details: Vec<RegionSummary>,
}

/// POST /upload
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut user_id: Option<String> = None;
    let mut uploads: Vec<RegionUpload> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart request: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "user_id" {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Unreadable user_id field: {e}")))?;
            user_id = Some(value);
        } else if let Some(region) = Region::from_field_name(&name) {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Unreadable file for {region}: {e}")))?;
            uploads.push(RegionUpload {
                region,
                filename,
                bytes: bytes.to_vec(),
            });
        }
        // Unknown fields are ignored.
    }

    let user_id = sanitize_user_id(user_id.as_deref().unwrap_or(""));
    info!(user_id = %user_id, parts = uploads.len(), "Upload batch received");

    let outcome = state
        .coordinator
        .run(&user_id, &uploads)
        .await
        .map_err(|e| match e {
            BatchError::InvalidInput(region) => {
                ApiError::BadRequest(format!("Invalid or missing file for {region}"))
            }
            BatchError::Storage(err) => ApiError::Internal(err.to_string()),
            BatchError::Internal(msg) => ApiError::Internal(msg),
        })?;

    Ok(Json(UploadResponse {
        success: true,
        user_id: outcome.user_id,
        details: outcome.details,
    }))
}

/// Build upload routes
pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
