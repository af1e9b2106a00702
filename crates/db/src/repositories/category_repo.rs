//! Repository for the `categories` table.

use fanray_core::slug;
use fanray_core::types::DbId;
use sqlx::PgPool;

use crate::models::category::Category;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, slug, description, post_count, created_at, updated_at";

/// Provides CRUD, title resolution, and recount operations for categories.
pub struct CategoryRepo;

impl CategoryRepo {
    /// Insert a new category, returning the created row. The slug must
    /// already be unique (see [`CategoryRepo::unique_slug`]).
    pub async fn create(
        pool: &PgPool,
        title: &str,
        slug: &str,
        description: Option<&str>,
    ) -> Result<Category, sqlx::Error> {
        let query = format!(
            "INSERT INTO categories (title, slug, description)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(title)
            .bind(slug)
            .bind(description)
            .fetch_one(pool)
            .await
    }

    /// Find a category by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE id = $1");
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a category by title, case-insensitively.
    pub async fn find_by_title_ci(
        pool: &PgPool,
        title: &str,
    ) -> Result<Option<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE LOWER(title) = LOWER($1)");
        sqlx::query_as::<_, Category>(&query)
            .bind(title)
            .fetch_optional(pool)
            .await
    }

    /// List all categories ordered by title.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories ORDER BY title ASC");
        sqlx::query_as::<_, Category>(&query).fetch_all(pool).await
    }

    /// Resolve a title to its category, creating one on demand (used by
    /// post handlers and the MetaWeblog surface, which send free-form
    /// category titles).
    pub async fn create_or_get(pool: &PgPool, title: &str) -> Result<Category, sqlx::Error> {
        if let Some(existing) = Self::find_by_title_ci(pool, title).await? {
            return Ok(existing);
        }
        let slug = Self::unique_slug(pool, &slug::slugify(title), None).await?;
        Self::create(pool, title, &slug, None).await
    }

    /// Update title/slug/description. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        title: Option<&str>,
        slug: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Category>, sqlx::Error> {
        let query = format!(
            "UPDATE categories SET
                title = COALESCE($2, title),
                slug = COALESCE($3, slug),
                description = COALESCE($4, description),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .bind(title)
            .bind(slug)
            .bind(description)
            .fetch_optional(pool)
            .await
    }

    /// Delete a category, reassigning its posts to `reassign_to`.
    /// Returns `true` if a row was removed.
    pub async fn delete(
        pool: &PgPool,
        id: DbId,
        reassign_to: DbId,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("UPDATE posts SET category_id = $2 WHERE category_id = $1")
            .bind(id)
            .bind(reassign_to)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether `slug` is taken by another category (global scope).
    pub async fn slug_taken(
        pool: &PgPool,
        slug: &str,
        exclude_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM categories
                WHERE slug = $1 AND ($2::bigint IS NULL OR id <> $2)
            )",
        )
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(pool)
        .await
    }

    /// Probe `candidate`, `candidate-2`, … until a free slug is found.
    pub async fn unique_slug(
        pool: &PgPool,
        candidate: &str,
        exclude_id: Option<DbId>,
    ) -> Result<String, sqlx::Error> {
        if !Self::slug_taken(pool, candidate, exclude_id).await? {
            return Ok(candidate.to_string());
        }
        let mut n = 2;
        loop {
            let probe = slug::with_suffix(candidate, n);
            if !Self::slug_taken(pool, &probe, exclude_id).await? {
                return Ok(probe);
            }
            n += 1;
        }
    }

    /// Refresh the denormalized `post_count` for one category.
    pub async fn recount(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE categories SET post_count = (
                SELECT COUNT(*) FROM posts
                WHERE category_id = $1 AND status = 'published'
             )
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }
}
