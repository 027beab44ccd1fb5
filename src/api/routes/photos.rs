//! Photo Routes
//!
//! - POST /api/v1/photos - Upload a batch (multipart)
//! - POST /api/v1/photos/remove - Remove one photo by index
//!
//! The upload form carries an `existing` field with the JSON array of the
//! gallery's current URLs, followed by one `files` (or `files[]`) part per
//! image. Neither route touches the car record; the returned list is saved
//! with the car form.
//!
//! File parts are read in chunks. Once a part passes the per-file size
//! limit its bytes are dropped and the rest of the part is drained, so one
//! oversized file is reported on its own instead of failing the batch.

use axum::{
    extract::{multipart::Field, Multipart, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{PhotosResponse, RemovePhotoRequest, UploadResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::auth::RequireSession;
use crate::gallery::IncomingPhoto;
use crate::notices;

const EXISTING_FIELD: &str = "existing";

fn is_file_field(name: &str) -> bool {
    matches!(name, "files" | "files[]" | "file")
}

/// POST /api/v1/photos
pub async fn upload_photos(
    _session: RequireSession,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut existing: Vec<String> = Vec::new();
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == EXISTING_FIELD {
            let raw = field.text().await.map_err(bad_multipart)?;
            if !raw.trim().is_empty() {
                existing = serde_json::from_str(&raw).map_err(|e| {
                    ApiError::validation(format!("Invalid `existing` photo list: {}", e))
                })?;
            }
        } else if is_file_field(&name) {
            files.push(read_photo(field, state.gallery.limits().max_file_size).await?);
        } else {
            tracing::debug!(field = %name, "Ignoring unknown multipart field");
        }
    }

    if files.is_empty() {
        return Err(ApiError::validation(notices::UPLOAD_FAILED));
    }

    let outcome = state.gallery.upload_batch(&existing, files).await?;

    let notice = if outcome.uploaded.is_empty() {
        outcome.rejected.first().map(|r| r.message.clone())
    } else {
        Some(notices::photos_uploaded(outcome.uploaded.len()))
    };

    Ok(Json(UploadResponse {
        photos: outcome.photos,
        uploaded: outcome.uploaded,
        rejected: outcome.rejected,
        notice,
    }))
}

/// POST /api/v1/photos/remove
pub async fn remove_photo(
    _session: RequireSession,
    State(state): State<Arc<AppState>>,
    Json(req): Json<RemovePhotoRequest>,
) -> ApiResult<Json<PhotosResponse>> {
    let photos = state.gallery.remove(&req.photos, req.index).await?;

    Ok(Json(PhotosResponse {
        photos,
        notice: notices::PHOTO_REMOVED,
    }))
}

async fn read_photo(mut field: Field<'_>, max_file_size: usize) -> ApiResult<IncomingPhoto> {
    let file_name = field.file_name().unwrap_or("foto").to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();

    let mut data = Vec::new();
    let mut size = 0usize;
    while let Some(chunk) = field.chunk().await.map_err(bad_multipart)? {
        size += chunk.len();
        if size <= max_file_size {
            data.extend_from_slice(&chunk);
        } else if !data.is_empty() {
            data = Vec::new();
        }
    }

    if size > max_file_size {
        tracing::debug!(file = %file_name, size, max = max_file_size, "Dropped oversized photo body");
        return Ok(IncomingPhoto::oversized(file_name, content_type, size));
    }
    Ok(IncomingPhoto::new(file_name, content_type, data))
}

fn bad_multipart(e: axum::extract::multipart::MultipartError) -> ApiError {
    tracing::warn!(error = %e, "Malformed multipart upload");
    ApiError::Validation {
        message: format!("Invalid multipart body: {}", e),
        notice: notices::UPLOAD_FAILED.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_field_names() {
        assert!(is_file_field("files"));
        assert!(is_file_field("files[]"));
        assert!(!is_file_field("existing"));
        assert!(!is_file_field("other"));
    }
}
