use axum::{
    extract::{Multipart, Path, Query, State},
    Extension, Json,
};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::{ApiResponse, AppError, Result};
use crate::models::{
    CurrentUser, ListPostsQuery, NewPost, PostDetailResponse, PostListResponse, PostResponse,
    UpdatePostRequest, UploadedPhoto,
};
use crate::services::PostService;
use crate::AppState;

/// List posts, newest first
/// GET /api/v1/posts?page=2&q=rust
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<ApiResponse<PostListResponse>>> {
    let listing = PostService::list_posts(&state.db, query).await?;
    Ok(Json(ApiResponse::success(listing)))
}

/// View a post with its comments
/// GET /api/v1/posts/:id
pub async fn view_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<PostDetailResponse>>> {
    let detail = PostService::get_post(&state.db, id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// Create a post
/// POST /api/v1/posts (multipart: title, content, category, tags, photo)
pub async fn create_post(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<PostResponse>>> {
    let mut input = NewPost::default();
    let mut photo: Option<UploadedPhoto> = None;
    let mut temp_file_path: Option<PathBuf> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to process multipart: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "title" => input.title = field.text().await.unwrap_or_default(),
            "content" => input.content = field.text().await.unwrap_or_default(),
            "category" => {
                let text = field.text().await.unwrap_or_default();
                input.category_id = text.trim().parse().ok();
            }
            "tags" => {
                let text = field.text().await.unwrap_or_default();
                input.tags = text.split(',').map(|t| t.trim().to_string()).collect();
            }
            "photo" => {
                let file_name = match field.file_name() {
                    Some(name) if !name.is_empty() => name.to_string(),
                    _ => continue,
                };

                // Stream the upload to a temp file
                let temp_path =
                    std::env::temp_dir().join(format!("inkpost_upload_{}", Uuid::new_v4()));
                let mut file = tokio::fs::File::create(&temp_path)
                    .await
                    .map_err(|e| AppError::Internal(format!("Failed to create temp file: {}", e)))?;

                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read photo: {}", e)))?
                {
                    file.write_all(&chunk).await.map_err(|e| {
                        AppError::Internal(format!("Failed to write temp file: {}", e))
                    })?;
                }
                file.flush()
                    .await
                    .map_err(|e| AppError::Internal(format!("Failed to flush temp file: {}", e)))?;

                temp_file_path = Some(temp_path.clone());
                photo = Some(UploadedPhoto {
                    temp_path,
                    file_name,
                });
            }
            _ => {}
        }
    }

    let result = PostService::create_post(
        &state.db,
        &state.storage,
        &state.jobs,
        &state.config,
        &current_user,
        input,
        photo,
    )
    .await;

    // Cleanup the staged upload regardless of outcome
    if let Some(temp_path) = temp_file_path {
        if let Err(e) = tokio::fs::remove_file(&temp_path).await {
            tracing::error!("Failed to remove temp file {:?}: {}", temp_path, e);
        }
    }

    let post = result?;
    Ok(Json(ApiResponse::success(post)))
}

/// Edit a post (owner only)
/// PUT /api/v1/posts/:id
pub async fn edit_post(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdatePostRequest>,
) -> Result<Json<ApiResponse<PostResponse>>> {
    let post = PostService::update_post(&state.db, &current_user, id, req).await?;
    Ok(Json(ApiResponse::success(post)))
}

/// Delete a post and everything attached to it (owner only)
/// DELETE /api/v1/posts/:id
pub async fn delete_post(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    PostService::delete_post(&state.db, &state.storage, &current_user, id).await?;
    Ok(Json(ApiResponse::<()>::success_message("Post deleted")))
}
