//! Bulk upload pass-through endpoint
//!
//! Accepts a batch of image files and forwards them to the backend library
//! in one request. The response is a per-file pass/fail list and nothing
//! more; there is no per-file progress protocol.

use crate::error::{ApiError, ApiResult};
use crate::models::SubjectImage;
use crate::services::UploadOutcome;
use crate::AppState;
use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use serde::Serialize;

/// Bulk upload response
#[derive(Debug, Serialize)]
pub struct BulkUploadResponse {
    pub outcomes: Vec<UploadOutcome>,
    pub all_ok: bool,
}

/// POST /upload/bulk
pub async fn bulk_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<BulkUploadResponse>> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("files") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data: Bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read file field: {}", e)))?;
        files.push(SubjectImage {
            file_name,
            content_type,
            data,
        });
    }

    let outcomes = state.coordinator.bulk_upload(files).await?;
    let all_ok = outcomes.iter().all(|o| o.ok);

    Ok(Json(BulkUploadResponse { outcomes, all_ok }))
}

/// Build upload routes
pub fn upload_routes() -> Router<AppState> {
    Router::new().route("/upload/bulk", post(bulk_upload))
}
