//! Upload API endpoints
//!
//! - POST /api/admin/upload/image - Upload a single image (multipart field `file`)
//!
//! Also hosts the multipart reader shared with the CV upload.

use axum::{
    extract::{Multipart, State},
    routing::post,
    Router,
};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::ApiResponse;
use crate::services::{validate_image, UploadError};

/// Response for successful upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
    pub filename: String,
}

/// A file part read from a multipart body
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Build the upload router
pub fn router() -> Router<AppState> {
    Router::new().route("/image", post(upload_image))
}

/// Read the first part named `file`, skipping any other parts
pub async fn read_file_field(multipart: &mut Multipart) -> Result<UploadedFile, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation_error(format!("Failed to read multipart: {}", e.body_text())))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().map(|s| s.to_string());
        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation_error(format!("Failed to read file: {}", e.body_text())))?;

        return Ok(UploadedFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Err(UploadError::Missing.into())
}

/// POST /api/admin/upload/image
///
/// The stored name is random; the client's filename only contributes its
/// extension, and only after it has been checked against the content.
async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<ApiResponse<UploadResponse>, ApiError> {
    let file = read_file_field(&mut multipart).await?;

    let image = validate_image(
        file.file_name.as_deref(),
        &file.content_type,
        &file.bytes,
        state.config.upload.max_image_size,
    )?;

    let url = state
        .storage
        .put(&image.key, file.bytes, image.kind.mime())
        .await
        .map_err(|e| {
            tracing::error!("Failed to store image {}: {:#}", image.key, e);
            ApiError::internal_error("Failed to store file")
        })?;

    tracing::info!("Image uploaded: {}", image.key);
    Ok(ApiResponse::ok(UploadResponse {
        url,
        filename: image.filename,
    }))
}
