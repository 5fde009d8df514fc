use chrono::Utc;
use std::path::Path;
use uuid::Uuid;

use crate::config::Config;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::jobs::{thumbnail, JobQueue, ThumbnailJob};
use crate::models::{
    Category, CurrentUser, ListPostsQuery, NewPost, Post, PostDetailResponse, PostListResponse,
    PostResponse, PostRow, Tag, UpdatePostRequest, UploadedPhoto,
};
use crate::pagination::{self, DEFAULT_PAGE_SIZE};
use crate::services::{authz, CommentService};
use crate::storage::{LocalStorage, StorageProvider};

/// Title limit, matching the column's intent
const MAX_TITLE_CHARS: usize = 200;
/// Tag name limit
const MAX_TAG_CHARS: usize = 40;

const POST_SELECT: &str = r#"
    SELECT p.id, p.user_id, u.username AS author, p.title, p.content,
           p.photo_path, p.category_id, c.name AS category,
           p.created_at, p.updated_at
    FROM posts p
    JOIN users u ON u.id = p.user_id
    JOIN categories c ON c.id = p.category_id
"#;

/// Post service
pub struct PostService;

impl PostService {
    /// Paginated listing, newest first, with an optional title/content filter
    pub async fn list_posts(db: &Database, query: ListPostsQuery) -> Result<PostListResponse> {
        let page = pagination::resolve_page(query.page.as_deref());
        let search = query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", q));

        let total: (i64,) = match &search {
            Some(pattern) => {
                sqlx::query_as("SELECT COUNT(*) FROM posts WHERE title LIKE ? OR content LIKE ?")
                    .bind(pattern)
                    .bind(pattern)
                    .fetch_one(db.pool())
                    .await?
            }
            None => {
                sqlx::query_as("SELECT COUNT(*) FROM posts")
                    .fetch_one(db.pool())
                    .await?
            }
        };

        // Validate the page before touching any rows
        let bounds = pagination::paginate(total.0 as u64, page, DEFAULT_PAGE_SIZE)?;

        let rows: Vec<PostRow> = match &search {
            Some(pattern) => {
                sqlx::query_as(&format!(
                    "{} WHERE p.title LIKE ? OR p.content LIKE ? ORDER BY p.created_at DESC, p.id DESC LIMIT ? OFFSET ?",
                    POST_SELECT
                ))
                .bind(pattern)
                .bind(pattern)
                .bind(bounds.limit() as i64)
                .bind(bounds.offset() as i64)
                .fetch_all(db.pool())
                .await?
            }
            None => {
                sqlx::query_as(&format!(
                    "{} ORDER BY p.created_at DESC, p.id DESC LIMIT ? OFFSET ?",
                    POST_SELECT
                ))
                .bind(bounds.limit() as i64)
                .bind(bounds.offset() as i64)
                .fetch_all(db.pool())
                .await?
            }
        };

        let mut posts = Vec::with_capacity(rows.len());
        for row in rows {
            let tags = Self::tags_for(db, row.id).await?;
            posts.push(PostResponse::from_row(row, tags));
        }

        Ok(PostListResponse {
            posts,
            page: bounds.page,
            page_size: bounds.size,
            total_posts: bounds.total_items,
            total_pages: bounds.total_pages,
        })
    }

    /// A single post with its comments
    pub async fn get_post(db: &Database, id: i64) -> Result<PostDetailResponse> {
        let post = Self::get_post_response(db, id).await?;
        let comments = CommentService::list_for_post(db, id).await?;

        Ok(PostDetailResponse { post, comments })
    }

    /// Create a post. A supplied photo is persisted to storage and a
    /// thumbnail job is enqueued; the job's outcome never affects this call.
    pub async fn create_post(
        db: &Database,
        storage: &LocalStorage,
        jobs: &JobQueue,
        config: &Config,
        user: &CurrentUser,
        input: NewPost,
        photo: Option<UploadedPhoto>,
    ) -> Result<PostResponse> {
        let title = input.title.trim().to_string();
        Self::validate_fields(&title, &input.content)?;

        let category_id = input
            .category_id
            .ok_or_else(|| AppError::validation("category", "A category is required"))?;
        Self::require_category(db, category_id).await?;

        // Persist the photo before inserting so a storage failure leaves no row
        let photo_path = match &photo {
            Some(upload) => Some(Self::store_photo(storage, upload).await?),
            None => None,
        };

        let tag_ids = Self::resolve_tags(db, &input.tags).await?;

        let now = Utc::now().to_rfc3339();
        let mut tx = db.pool().begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO posts (user_id, title, content, photo_path, category_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&title)
        .bind(&input.content)
        .bind(&photo_path)
        .bind(category_id)
        .bind(&now)
        .bind(&now)
        .execute(tx.as_mut())
        .await?;
        let post_id = result.last_insert_rowid();

        for tag_id in &tag_ids {
            sqlx::query("INSERT INTO post_tags (post_id, tag_id) VALUES (?, ?)")
                .bind(post_id)
                .bind(tag_id)
                .execute(tx.as_mut())
                .await?;
        }

        tx.commit().await?;

        if let Some(rel_path) = &photo_path {
            jobs.enqueue(ThumbnailJob {
                source_path: storage.full_path(rel_path),
                max_width: config.thumbnail.max_width,
                max_height: config.thumbnail.max_height,
            });
        }

        Self::get_post_response(db, post_id).await
    }

    /// Edit a post. Owner-only.
    pub async fn update_post(
        db: &Database,
        user: &CurrentUser,
        id: i64,
        req: UpdatePostRequest,
    ) -> Result<PostResponse> {
        let post = Self::fetch_post(db, id).await?;
        authz::ensure_can_mutate(&user.id, &post.user_id, "post")?;

        let title = req.title.trim().to_string();
        Self::validate_fields(&title, &req.content)?;
        Self::require_category(db, req.category_id).await?;

        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "UPDATE posts SET title = ?, content = ?, category_id = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&title)
        .bind(&req.content)
        .bind(req.category_id)
        .bind(&now)
        .bind(id)
        .execute(db.pool())
        .await?;

        Self::get_post_response(db, id).await
    }

    /// Delete a post. Owner-only. Comments and tag links go in the same
    /// transaction as the post row; the photo and its thumbnail are removed
    /// from storage afterwards, with failures logged rather than surfaced.
    pub async fn delete_post(
        db: &Database,
        storage: &LocalStorage,
        user: &CurrentUser,
        id: i64,
    ) -> Result<()> {
        let post = Self::fetch_post(db, id).await?;
        authz::ensure_can_mutate(&user.id, &post.user_id, "post")?;

        let mut tx = db.pool().begin().await?;
        sqlx::query("DELETE FROM comments WHERE post_id = ?")
            .bind(id)
            .execute(tx.as_mut())
            .await?;
        sqlx::query("DELETE FROM post_tags WHERE post_id = ?")
            .bind(id)
            .execute(tx.as_mut())
            .await?;
        sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(tx.as_mut())
            .await?;
        tx.commit().await?;

        if let Some(rel_path) = &post.photo_path {
            if let Err(e) = storage.delete(rel_path).await {
                tracing::error!("Failed to delete photo {}: {}", rel_path, e);
            }

            let thumb_rel = thumbnail::thumbnail_path(Path::new(rel_path))
                .to_string_lossy()
                .into_owned();
            if let Err(e) = storage.delete(&thumb_rel).await {
                tracing::error!("Failed to delete thumbnail {}: {}", thumb_rel, e);
            }
        }

        Ok(())
    }

    /// Bare post row, for ownership checks and cascades
    pub(crate) async fn fetch_post(db: &Database, id: i64) -> Result<Post> {
        sqlx::query_as("SELECT * FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(db.pool())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", id)))
    }

    async fn get_post_response(db: &Database, id: i64) -> Result<PostResponse> {
        let row: PostRow = sqlx::query_as(&format!("{} WHERE p.id = ?", POST_SELECT))
            .bind(id)
            .fetch_optional(db.pool())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", id)))?;

        let tags = Self::tags_for(db, id).await?;
        Ok(PostResponse::from_row(row, tags))
    }

    async fn tags_for(db: &Database, post_id: i64) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as(
            r#"
            SELECT t.id, t.name
            FROM tags t
            JOIN post_tags pt ON pt.tag_id = t.id
            WHERE pt.post_id = ?
            ORDER BY t.name ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(db.pool())
        .await?;

        Ok(tags)
    }

    fn validate_fields(title: &str, content: &str) -> Result<()> {
        if title.is_empty() {
            return Err(AppError::validation("title", "A title is required"));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(AppError::validation(
                "title",
                "Title must be at most 200 characters",
            ));
        }
        if content.trim().is_empty() {
            return Err(AppError::validation("content", "Content is required"));
        }
        Ok(())
    }

    async fn require_category(db: &Database, id: i64) -> Result<Category> {
        sqlx::query_as("SELECT * FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(db.pool())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    /// Copy the staged upload into the media root under a fresh name
    async fn store_photo(storage: &LocalStorage, upload: &UploadedPhoto) -> Result<String> {
        let extension = Path::new(&upload.file_name)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default();

        let rel_path = format!("photos/{}{}", Uuid::new_v4(), extension);
        storage.put_file(&rel_path, &upload.temp_path).await?;

        Ok(rel_path)
    }

    /// Look up tag ids by name, creating tags that do not exist yet
    async fn resolve_tags(db: &Database, names: &[String]) -> Result<Vec<i64>> {
        let mut ids = Vec::new();

        for raw in names {
            let name = raw.trim();
            if name.is_empty() {
                continue;
            }
            if name.chars().count() > MAX_TAG_CHARS {
                return Err(AppError::validation(
                    "tags",
                    "Tag names must be at most 40 characters",
                ));
            }

            let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM tags WHERE name = ?")
                .bind(name)
                .fetch_optional(db.pool())
                .await?;

            let id = match existing {
                Some((id,)) => id,
                None => sqlx::query("INSERT INTO tags (name) VALUES (?)")
                    .bind(name)
                    .execute(db.pool())
                    .await?
                    .last_insert_rowid(),
            };

            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::TaxonomyService;

    struct Fixture {
        db: Database,
        storage: LocalStorage,
        jobs: JobQueue,
        config: Config,
        category_id: i64,
        _media_dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let db = Database::new_in_memory().await.unwrap();
        let media_dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(media_dir.path());
        let category = TaxonomyService::create_category(&db, "News").await.unwrap();

        Fixture {
            db,
            storage,
            jobs: JobQueue::start(),
            config: Config::default(),
            category_id: category.id,
            _media_dir: media_dir,
        }
    }

    async fn seed_user(db: &Database, id: &str, username: &str) -> CurrentUser {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO users (id, username, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(username)
        .bind("x")
        .bind(&now)
        .bind(&now)
        .execute(db.pool())
        .await
        .unwrap();

        CurrentUser {
            id: id.to_string(),
            username: username.to_string(),
        }
    }

    async fn create_simple_post(fx: &Fixture, user: &CurrentUser, title: &str) -> PostResponse {
        PostService::create_post(
            &fx.db,
            &fx.storage,
            &fx.jobs,
            &fx.config,
            user,
            NewPost {
                title: title.to_string(),
                content: format!("content of {}", title),
                category_id: Some(fx.category_id),
                tags: Vec::new(),
            },
            None,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn created_post_is_retrievable_and_listed_first() {
        let fx = fixture().await;
        let alice = seed_user(&fx.db, "u1", "alice").await;

        create_simple_post(&fx, &alice, "older").await;
        let newest = create_simple_post(&fx, &alice, "newest").await;

        let detail = PostService::get_post(&fx.db, newest.id).await.unwrap();
        assert_eq!(detail.post.title, "newest");
        assert_eq!(detail.post.author, "alice");
        assert_eq!(detail.post.category, "News");

        let listing = PostService::list_posts(
            &fx.db,
            ListPostsQuery {
                page: None,
                q: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(listing.posts[0].id, newest.id);
    }

    #[tokio::test]
    async fn create_post_validates_fields() {
        let fx = fixture().await;
        let alice = seed_user(&fx.db, "u1", "alice").await;

        let attempt = |title: &str, content: &str, category_id: Option<i64>| NewPost {
            title: title.to_string(),
            content: content.to_string(),
            category_id,
            tags: Vec::new(),
        };

        let cases = [
            (attempt("", "content", Some(fx.category_id)), "title"),
            (attempt("   ", "content", Some(fx.category_id)), "title"),
            (
                attempt(&"x".repeat(201), "content", Some(fx.category_id)),
                "title",
            ),
            (attempt("title", "", Some(fx.category_id)), "content"),
            (attempt("title", "  \n ", Some(fx.category_id)), "content"),
            (attempt("title", "content", None), "category"),
        ];

        for (input, expected_field) in cases {
            let err = PostService::create_post(
                &fx.db,
                &fx.storage,
                &fx.jobs,
                &fx.config,
                &alice,
                input,
                None,
            )
            .await
            .unwrap_err();
            assert!(
                matches!(err, AppError::Validation { ref field, .. } if field == expected_field),
                "expected validation on {}, got {:?}",
                expected_field,
                err
            );
        }
    }

    #[tokio::test]
    async fn unknown_category_is_not_found() {
        let fx = fixture().await;
        let alice = seed_user(&fx.db, "u1", "alice").await;

        let err = PostService::create_post(
            &fx.db,
            &fx.storage,
            &fx.jobs,
            &fx.config,
            &alice,
            NewPost {
                title: "title".to_string(),
                content: "content".to_string(),
                category_id: Some(9999),
                tags: Vec::new(),
            },
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn listing_pages_through_seven_posts() {
        let fx = fixture().await;
        let alice = seed_user(&fx.db, "u1", "alice").await;

        for i in 1..=7 {
            create_simple_post(&fx, &alice, &format!("post-{}", i)).await;
        }

        let page1 = PostService::list_posts(
            &fx.db,
            ListPostsQuery {
                page: None,
                q: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(page1.total_posts, 7);
        assert_eq!(page1.total_pages, 3);
        let titles: Vec<_> = page1.posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["post-7", "post-6", "post-5"]);

        // Non-numeric page falls back to page 1
        let fallback = PostService::list_posts(
            &fx.db,
            ListPostsQuery {
                page: Some("abc".to_string()),
                q: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(fallback.page, 1);
        assert_eq!(fallback.posts[0].title, "post-7");

        let page3 = PostService::list_posts(
            &fx.db,
            ListPostsQuery {
                page: Some("3".to_string()),
                q: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(page3.posts.len(), 1);
        assert_eq!(page3.posts[0].title, "post-1");

        let err = PostService::list_posts(
            &fx.db,
            ListPostsQuery {
                page: Some("99".to_string()),
                q: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn search_filters_by_title_and_content() {
        let fx = fixture().await;
        let alice = seed_user(&fx.db, "u1", "alice").await;

        create_simple_post(&fx, &alice, "Rust news").await;
        create_simple_post(&fx, &alice, "Cooking").await;

        let found = PostService::list_posts(
            &fx.db,
            ListPostsQuery {
                page: None,
                q: Some("rust".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(found.total_posts, 1);
        assert_eq!(found.posts[0].title, "Rust news");
    }

    #[tokio::test]
    async fn tags_are_created_and_shared() {
        let fx = fixture().await;
        let alice = seed_user(&fx.db, "u1", "alice").await;

        let first = PostService::create_post(
            &fx.db,
            &fx.storage,
            &fx.jobs,
            &fx.config,
            &alice,
            NewPost {
                title: "first".to_string(),
                content: "content".to_string(),
                category_id: Some(fx.category_id),
                tags: vec!["rust".to_string(), "web".to_string()],
            },
            None,
        )
        .await
        .unwrap();
        assert_eq!(first.tags.len(), 2);

        let second = PostService::create_post(
            &fx.db,
            &fx.storage,
            &fx.jobs,
            &fx.config,
            &alice,
            NewPost {
                title: "second".to_string(),
                content: "content".to_string(),
                category_id: Some(fx.category_id),
                tags: vec!["rust".to_string()],
            },
            None,
        )
        .await
        .unwrap();

        // Same tag row on both posts
        let shared_first = first.tags.iter().find(|t| t.name == "rust").unwrap();
        let shared_second = second.tags.iter().find(|t| t.name == "rust").unwrap();
        assert_eq!(shared_first.id, shared_second.id);
    }

    #[tokio::test]
    async fn delete_post_cascades_to_comments_and_files() {
        let fx = fixture().await;
        let alice = seed_user(&fx.db, "u1", "alice").await;
        let bob = seed_user(&fx.db, "u2", "bob").await;

        // Deliberately not a decodable image: the enqueued thumbnail job
        // fails harmlessly instead of racing this test's staged thumbnail.
        let staged = fx._media_dir.path().join("upload.png");
        std::fs::write(&staged, b"raw photo bytes").unwrap();

        let post = PostService::create_post(
            &fx.db,
            &fx.storage,
            &fx.jobs,
            &fx.config,
            &alice,
            NewPost {
                title: "with photo".to_string(),
                content: "content".to_string(),
                category_id: Some(fx.category_id),
                tags: vec!["rust".to_string()],
            },
            Some(UploadedPhoto {
                temp_path: staged,
                file_name: "upload.png".to_string(),
            }),
        )
        .await
        .unwrap();

        let row = PostService::fetch_post(&fx.db, post.id).await.unwrap();
        let photo_rel = row.photo_path.clone().unwrap();
        assert!(fx.storage.exists(&photo_rel).await.unwrap());

        // Stage a thumbnail as the worker would have
        let thumb_rel = thumbnail::thumbnail_path(Path::new(&photo_rel))
            .to_string_lossy()
            .into_owned();
        fx.storage
            .put(&thumb_rel, bytes::Bytes::from_static(b"thumb"))
            .await
            .unwrap();

        CommentService::create_comment(&fx.db, post.id, &bob, "nice")
            .await
            .unwrap();

        PostService::delete_post(&fx.db, &fx.storage, &alice, post.id)
            .await
            .unwrap();

        let err = PostService::get_post(&fx.db, post.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let comments: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM comments WHERE post_id = ?")
            .bind(post.id)
            .fetch_one(fx.db.pool())
            .await
            .unwrap();
        assert_eq!(comments.0, 0);

        assert!(!fx.storage.exists(&photo_rel).await.unwrap());
        assert!(!fx.storage.exists(&thumb_rel).await.unwrap());
    }

    #[tokio::test]
    async fn non_owner_mutations_are_forbidden() {
        let fx = fixture().await;
        let alice = seed_user(&fx.db, "u1", "alice").await;
        let bob = seed_user(&fx.db, "u2", "bob").await;

        let post = create_simple_post(&fx, &alice, "alice's post").await;

        let err = PostService::update_post(
            &fx.db,
            &bob,
            post.id,
            UpdatePostRequest {
                title: "hijacked".to_string(),
                content: "hijacked".to_string(),
                category_id: fx.category_id,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = PostService::delete_post(&fx.db, &fx.storage, &bob, post.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        // The post is untouched
        let detail = PostService::get_post(&fx.db, post.id).await.unwrap();
        assert_eq!(detail.post.title, "alice's post");
    }

    #[tokio::test]
    async fn owner_can_edit_their_post() {
        let fx = fixture().await;
        let alice = seed_user(&fx.db, "u1", "alice").await;
        let post = create_simple_post(&fx, &alice, "draft").await;

        let other_category = TaxonomyService::create_category(&fx.db, "Cooking")
            .await
            .unwrap();

        let updated = PostService::update_post(
            &fx.db,
            &alice,
            post.id,
            UpdatePostRequest {
                title: "final".to_string(),
                content: "revised".to_string(),
                category_id: other_category.id,
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.title, "final");
        assert_eq!(updated.content, "revised");
        assert_eq!(updated.category, "Cooking");
        assert_eq!(updated.created_at, post.created_at);
    }
}
