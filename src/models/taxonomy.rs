use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Category model. Every post belongs to exactly one category.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Tag model. Shared across posts, no ownership.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// Create category request
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}
