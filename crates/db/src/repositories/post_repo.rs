//! Repository for the `posts` table (blog posts and pages).

use chrono::NaiveDate;
use fanray_core::types::DbId;
use sqlx::PgPool;

use crate::models::post::{
    ArchiveMonth, CreatePostRow, Post, PostStatusCounts, UpdatePostRow, STATUS_DRAFT,
    STATUS_PUBLISHED, TYPE_BLOG_POST,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, parent_id, category_id, post_type, status, title, slug, \
    body, excerpt, comments_enabled, created_at, updated_at";

/// Provides CRUD and listing operations for posts and pages.
pub struct PostRepo;

impl PostRepo {
    /// Insert a new post, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreatePostRow) -> Result<Post, sqlx::Error> {
        let query = format!(
            "INSERT INTO posts (user_id, parent_id, category_id, post_type, status, title, slug, \
                body, excerpt, comments_enabled, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, COALESCE($11, NOW()))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Post>(&query)
            .bind(input.user_id)
            .bind(input.parent_id)
            .bind(input.category_id)
            .bind(&input.post_type)
            .bind(&input.status)
            .bind(&input.title)
            .bind(&input.slug)
            .bind(&input.body)
            .bind(&input.excerpt)
            .bind(input.comments_enabled)
            .bind(input.created_at)
            .fetch_one(pool)
            .await
    }

    /// Find a post by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Post>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM posts WHERE id = $1");
        sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Apply a full-value update. Returns `None` if no row exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdatePostRow,
    ) -> Result<Option<Post>, sqlx::Error> {
        let query = format!(
            "UPDATE posts SET
                category_id = $2,
                status = $3,
                title = $4,
                slug = $5,
                body = $6,
                excerpt = $7,
                comments_enabled = $8,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Post>(&query)
            .bind(id)
            .bind(input.category_id)
            .bind(&input.status)
            .bind(&input.title)
            .bind(&input.slug)
            .bind(&input.body)
            .bind(&input.excerpt)
            .bind(input.comments_enabled)
            .fetch_optional(pool)
            .await
    }

    /// Delete a post by ID. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Listings
    // -----------------------------------------------------------------------

    /// Admin listing of one post type, optionally filtered by status,
    /// newest first.
    pub async fn list(
        pool: &PgPool,
        post_type: &str,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM posts
             WHERE post_type = $1 AND ($2::text IS NULL OR status = $2)
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Post>(&query)
            .bind(post_type)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count rows of one post type, optionally filtered by status.
    pub async fn count(
        pool: &PgPool,
        post_type: &str,
        status: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM posts
             WHERE post_type = $1 AND ($2::text IS NULL OR status = $2)",
        )
        .bind(post_type)
        .bind(status)
        .fetch_one(pool)
        .await
    }

    /// Published blog posts, newest first (the public index).
    pub async fn list_published(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, sqlx::Error> {
        Self::list(pool, TYPE_BLOG_POST, Some(STATUS_PUBLISHED), limit, offset).await
    }

    /// Most recent blog posts regardless of status (MetaWeblog
    /// `getRecentPosts`).
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<Post>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM posts
             WHERE post_type = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2"
        );
        sqlx::query_as::<_, Post>(&query)
            .bind(TYPE_BLOG_POST)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Child pages of a parent, ordered by creation.
    pub async fn list_children(pool: &PgPool, parent_id: DbId) -> Result<Vec<Post>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM posts
             WHERE parent_id = $1
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, Post>(&query)
            .bind(parent_id)
            .fetch_all(pool)
            .await
    }

    /// Root pages (no parent), ordered by creation.
    pub async fn list_root_pages(pool: &PgPool) -> Result<Vec<Post>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM posts
             WHERE post_type = 'page' AND parent_id IS NULL
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, Post>(&query).fetch_all(pool).await
    }

    /// Whether a page has any children (blocks deletion).
    pub async fn has_children(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE parent_id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Slug conflict scopes
    // -----------------------------------------------------------------------

    /// Whether `slug` is taken by another blog post created on `date`.
    ///
    /// Blog post URLs embed the creation date, so the conflict scope is
    /// per-day, not global.
    pub async fn blog_slug_taken(
        pool: &PgPool,
        slug: &str,
        date: NaiveDate,
        exclude_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM posts
                WHERE post_type = 'blog_post'
                  AND slug = $1
                  AND created_at::date = $2
                  AND ($3::bigint IS NULL OR id <> $3)
            )",
        )
        .bind(slug)
        .bind(date)
        .bind(exclude_id)
        .fetch_one(pool)
        .await
    }

    /// Whether `slug` is taken by a sibling page (same parent).
    pub async fn page_slug_taken(
        pool: &PgPool,
        slug: &str,
        parent_id: Option<DbId>,
        exclude_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM posts
                WHERE post_type = 'page'
                  AND slug = $1
                  AND parent_id IS NOT DISTINCT FROM $2
                  AND ($3::bigint IS NULL OR id <> $3)
            )",
        )
        .bind(slug)
        .bind(parent_id)
        .bind(exclude_id)
        .fetch_one(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Stats
    // -----------------------------------------------------------------------

    /// Published blog posts grouped by year/month, newest month first.
    pub async fn archive_counts(pool: &PgPool) -> Result<Vec<ArchiveMonth>, sqlx::Error> {
        sqlx::query_as::<_, ArchiveMonth>(
            "SELECT CAST(EXTRACT(YEAR FROM created_at) AS INT4) AS year,
                    CAST(EXTRACT(MONTH FROM created_at) AS INT4) AS month,
                    COUNT(*) AS count
             FROM posts
             WHERE post_type = 'blog_post' AND status = 'published'
             GROUP BY 1, 2
             ORDER BY 1 DESC, 2 DESC",
        )
        .fetch_all(pool)
        .await
    }

    /// Blog post totals per status.
    pub async fn count_by_status(pool: &PgPool) -> Result<PostStatusCounts, sqlx::Error> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM posts WHERE post_type = 'blog_post' GROUP BY status",
        )
        .fetch_all(pool)
        .await?;

        let mut counts = PostStatusCounts::default();
        for (status, n) in rows {
            match status.as_str() {
                STATUS_DRAFT => counts.draft = n,
                STATUS_PUBLISHED => counts.published = n,
                _ => {}
            }
            counts.total += n;
        }
        Ok(counts)
    }
}
