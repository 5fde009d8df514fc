use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};

use crate::error::{AppError, Result};
use crate::storage::StorageProvider;
use crate::AppState;

/// Serve an uploaded photo or thumbnail
/// GET /api/v1/media/*path
pub async fn get_media(State(state): State<AppState>, Path(path): Path<String>) -> Result<Response> {
    // Keep lookups inside the media root
    if path.split('/').any(|part| part == ".." || part.is_empty()) {
        return Err(AppError::BadRequest("Invalid media path".to_string()));
    }

    let data = state.storage.get(&path).await?;

    let content_type = mime_guess::from_path(&path)
        .first_or_octet_stream()
        .to_string();

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, data.len())
        .body(Body::from(data))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}
