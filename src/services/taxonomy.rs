use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{Category, Tag};

/// Category and tag service
pub struct TaxonomyService;

impl TaxonomyService {
    /// List all categories
    pub async fn list_categories(db: &Database) -> Result<Vec<Category>> {
        let categories = sqlx::query_as("SELECT * FROM categories ORDER BY name ASC")
            .fetch_all(db.pool())
            .await?;
        Ok(categories)
    }

    /// Create a category
    pub async fn create_category(db: &Database, name: &str) -> Result<Category> {
        let name = name.trim();

        if name.is_empty() {
            return Err(AppError::validation("name", "Category name is required"));
        }
        if name.chars().count() > 40 {
            return Err(AppError::validation(
                "name",
                "Category name must be at most 40 characters",
            ));
        }

        let existing: Option<Category> = sqlx::query_as("SELECT * FROM categories WHERE name = ?")
            .bind(name)
            .fetch_optional(db.pool())
            .await?;

        if existing.is_some() {
            return Err(AppError::Conflict(format!(
                "Category '{}' already exists",
                name
            )));
        }

        let result = sqlx::query("INSERT INTO categories (name) VALUES (?)")
            .bind(name)
            .execute(db.pool())
            .await?;

        let category = sqlx::query_as("SELECT * FROM categories WHERE id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(db.pool())
            .await?;

        Ok(category)
    }

    /// Delete a category. Categories still referenced by posts cannot be
    /// deleted; callers must reassign those posts first.
    pub async fn delete_category(db: &Database, id: i64) -> Result<()> {
        let existing: Option<Category> = sqlx::query_as("SELECT * FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(db.pool())
            .await?;

        if existing.is_none() {
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }

        let in_use: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts WHERE category_id = ?")
            .bind(id)
            .fetch_one(db.pool())
            .await?;

        if in_use.0 > 0 {
            return Err(AppError::Conflict(format!(
                "Category {} is still used by {} post(s)",
                id, in_use.0
            )));
        }

        sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(db.pool())
            .await?;

        Ok(())
    }

    /// List all tags
    pub async fn list_tags(db: &Database) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as("SELECT * FROM tags ORDER BY name ASC")
            .fetch_all(db.pool())
            .await?;
        Ok(tags)
    }
}
