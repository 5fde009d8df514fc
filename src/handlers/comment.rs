use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Extension, Json,
};

use crate::error::{ApiResponse, Result};
use crate::middleware::auth::login_redirect;
use crate::models::{CreateCommentRequest, CurrentUser};
use crate::services::CommentService;
use crate::AppState;

/// Comment on a post. Anonymous visitors are sent to login instead.
/// POST /api/v1/posts/:id/comments
pub async fn create_comment(
    State(state): State<AppState>,
    current_user: Option<Extension<CurrentUser>>,
    Path(post_id): Path<i64>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<Response> {
    let Some(Extension(current_user)) = current_user else {
        return Ok(login_redirect());
    };

    let comment =
        CommentService::create_comment(&state.db, post_id, &current_user, &req.content).await?;
    Ok(Json(ApiResponse::success(comment)).into_response())
}

/// Delete a comment (owner only)
/// DELETE /api/v1/comments/:id
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    CommentService::delete_comment(&state.db, &current_user, id).await?;
    Ok(Json(ApiResponse::<()>::success_message("Comment deleted")))
}
