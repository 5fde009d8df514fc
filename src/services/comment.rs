use chrono::Utc;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{Comment, CommentResponse, CurrentUser};
use crate::services::authz;

/// Comment content limit, matching the column's intent
const MAX_CONTENT_CHARS: usize = 200;

/// Comment service
pub struct CommentService;

impl CommentService {
    /// List comments on a post, oldest first
    pub async fn list_for_post(db: &Database, post_id: i64) -> Result<Vec<CommentResponse>> {
        let comments = sqlx::query_as(
            r#"
            SELECT c.id, c.user_id, u.username AS author, c.post_id, c.content,
                   c.created_at, c.updated_at
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.post_id = ?
            ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(db.pool())
        .await?;

        Ok(comments)
    }

    /// Attach a comment to a post
    pub async fn create_comment(
        db: &Database,
        post_id: i64,
        user: &CurrentUser,
        content: &str,
    ) -> Result<CommentResponse> {
        let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM posts WHERE id = ?")
            .bind(post_id)
            .fetch_optional(db.pool())
            .await?;

        if exists.is_none() {
            return Err(AppError::NotFound(format!("Post {} not found", post_id)));
        }

        if content.trim().is_empty() {
            return Err(AppError::validation("content", "Comment must not be empty"));
        }
        if content.chars().count() > MAX_CONTENT_CHARS {
            return Err(AppError::validation(
                "content",
                "Comment must be at most 200 characters",
            ));
        }

        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            INSERT INTO comments (user_id, post_id, content, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(post_id)
        .bind(content)
        .bind(&now)
        .bind(&now)
        .execute(db.pool())
        .await?;

        let comment = sqlx::query_as(
            r#"
            SELECT c.id, c.user_id, u.username AS author, c.post_id, c.content,
                   c.created_at, c.updated_at
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.id = ?
            "#,
        )
        .bind(result.last_insert_rowid())
        .fetch_one(db.pool())
        .await?;

        Ok(comment)
    }

    /// Delete a comment. Owner-only.
    pub async fn delete_comment(db: &Database, user: &CurrentUser, id: i64) -> Result<()> {
        let comment: Comment = sqlx::query_as("SELECT * FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(db.pool())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment {} not found", id)))?;

        authz::ensure_can_mutate(&user.id, &comment.user_id, "comment")?;

        sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(db.pool())
            .await?;

        Ok(())
    }
}
