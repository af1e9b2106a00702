//! Repository for the `tags` table and the `post_tags` junction.

use fanray_core::slug;
use fanray_core::types::DbId;
use sqlx::PgPool;

use crate::models::tag::Tag;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, slug, description, post_count, created_at, updated_at";

/// Provides CRUD, title resolution, and post-association operations for
/// tags.
pub struct TagRepo;

impl TagRepo {
    /// Insert a new tag, returning the created row. The slug must already
    /// be unique (see [`TagRepo::unique_slug`]).
    pub async fn create(
        pool: &PgPool,
        title: &str,
        slug: &str,
        description: Option<&str>,
    ) -> Result<Tag, sqlx::Error> {
        let query = format!(
            "INSERT INTO tags (title, slug, description)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(title)
            .bind(slug)
            .bind(description)
            .fetch_one(pool)
            .await
    }

    /// Find a tag by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Tag>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tags WHERE id = $1");
        sqlx::query_as::<_, Tag>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a tag by title, case-insensitively.
    pub async fn find_by_title_ci(pool: &PgPool, title: &str) -> Result<Option<Tag>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tags WHERE LOWER(title) = LOWER($1)");
        sqlx::query_as::<_, Tag>(&query)
            .bind(title)
            .fetch_optional(pool)
            .await
    }

    /// List all tags ordered by title.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Tag>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tags ORDER BY title ASC");
        sqlx::query_as::<_, Tag>(&query).fetch_all(pool).await
    }

    /// Resolve a title to its tag, creating one on demand.
    pub async fn create_or_get(pool: &PgPool, title: &str) -> Result<Tag, sqlx::Error> {
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
    ) -> Result<Option<Tag>, sqlx::Error> {
        let query = format!(
            "UPDATE tags SET
                title = COALESCE($2, title),
                slug = COALESCE($3, slug),
                description = COALESCE($4, description),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(id)
            .bind(title)
            .bind(slug)
            .bind(description)
            .fetch_optional(pool)
            .await
    }

    /// Delete a tag and its post associations. Returns `true` if a row
    /// was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether `slug` is taken by another tag (global scope).
    pub async fn slug_taken(
        pool: &PgPool,
        slug: &str,
        exclude_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM tags
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

    // -----------------------------------------------------------------------
    // Post associations
    // -----------------------------------------------------------------------

    /// Tags applied to a post, ordered by title.
    pub async fn tags_for_post(pool: &PgPool, post_id: DbId) -> Result<Vec<Tag>, sqlx::Error> {
        let query = format!(
            "SELECT t.{} FROM tags t
             JOIN post_tags pt ON pt.tag_id = t.id
             WHERE pt.post_id = $1
             ORDER BY t.title ASC",
            COLUMNS.replace(", ", ", t.")
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(post_id)
            .fetch_all(pool)
            .await
    }

    /// Replace a post's tag set with exactly `tag_ids`, then recount the
    /// affected tags (both removed and added).
    pub async fn set_post_tags(
        pool: &PgPool,
        post_id: DbId,
        tag_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        let previous: Vec<DbId> =
            sqlx::query_scalar("SELECT tag_id FROM post_tags WHERE post_id = $1")
                .bind(post_id)
                .fetch_all(pool)
                .await?;

        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;
        for tag_id in tag_ids {
            sqlx::query(
                "INSERT INTO post_tags (post_id, tag_id) VALUES ($1, $2)
                 ON CONFLICT DO NOTHING",
            )
            .bind(post_id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        let mut affected: Vec<DbId> = previous;
        affected.extend_from_slice(tag_ids);
        affected.sort_unstable();
        affected.dedup();
        for tag_id in affected {
            Self::recount(pool, tag_id).await?;
        }
        Ok(())
    }

    /// Refresh the denormalized `post_count` for one tag.
    pub async fn recount(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE tags SET post_count = (
                SELECT COUNT(*) FROM post_tags pt
                JOIN posts p ON p.id = pt.post_id
                WHERE pt.tag_id = $1 AND p.status = 'published'
             )
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }
}
