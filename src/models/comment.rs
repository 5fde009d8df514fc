use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Comment model
#[derive(Debug, Clone, FromRow)]
pub struct Comment {
    pub id: i64,
    pub user_id: String,
    pub post_id: i64,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Comment joined with its author's username
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CommentResponse {
    pub id: i64,
    pub user_id: String,
    pub author: String,
    pub post_id: i64,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Create comment request
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}
