use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::path::{Path, PathBuf};

use crate::jobs::thumbnail::thumbnail_path;
use crate::models::{CommentResponse, Tag};

/// Post model
#[derive(Debug, Clone, FromRow)]
pub struct Post {
    pub id: i64,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub photo_path: Option<String>,
    pub category_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Post row joined with author and category names
#[derive(Debug, Clone, FromRow)]
pub struct PostRow {
    pub id: i64,
    pub user_id: String,
    pub author: String,
    pub title: String,
    pub content: String,
    pub photo_path: Option<String>,
    pub category_id: i64,
    pub category: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Post response with media URLs and tags
#[derive(Debug, Clone, Serialize)]
pub struct PostResponse {
    pub id: i64,
    pub user_id: String,
    pub author: String,
    pub title: String,
    pub content: String,
    pub photo_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub category_id: i64,
    pub category: String,
    pub tags: Vec<Tag>,
    pub created_at: String,
    pub updated_at: String,
}

impl PostResponse {
    pub fn from_row(row: PostRow, tags: Vec<Tag>) -> Self {
        let photo_url = row.photo_path.as_deref().map(media_url);
        // The thumbnail may still be pending; the URL is derivable either way
        let thumbnail_url = row
            .photo_path
            .as_deref()
            .map(|p| media_url(&thumbnail_path(Path::new(p)).to_string_lossy()));

        Self {
            id: row.id,
            user_id: row.user_id,
            author: row.author,
            title: row.title,
            content: row.content,
            photo_url,
            thumbnail_url,
            category_id: row.category_id,
            category: row.category,
            tags,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Public URL for a file stored under the media root
pub fn media_url(rel_path: &str) -> String {
    format!("/api/v1/media/{}", rel_path)
}

/// Paginated post listing
#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub posts: Vec<PostResponse>,
    pub page: u64,
    pub page_size: u64,
    pub total_posts: u64,
    pub total_pages: u64,
}

/// Post detail with its comments
#[derive(Debug, Serialize)]
pub struct PostDetailResponse {
    pub post: PostResponse,
    pub comments: Vec<CommentResponse>,
}

/// Listing query parameters
#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    /// Raw page parameter; non-numeric values fall back to page 1
    pub page: Option<String>,
    /// Title/content search filter
    pub q: Option<String>,
}

/// Fields for a new post, collected from the multipart form
#[derive(Debug, Default)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub category_id: Option<i64>,
    pub tags: Vec<String>,
}

/// Photo upload staged in a temp file by the handler
#[derive(Debug)]
pub struct UploadedPhoto {
    pub temp_path: PathBuf,
    pub file_name: String,
}

/// Edit post request
#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub title: String,
    pub content: String,
    pub category_id: i64,
}
