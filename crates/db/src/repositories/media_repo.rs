//! Repository for the `media` table.

use fanray_core::types::DbId;
use sqlx::PgPool;

use crate::models::media::{CreateMedia, Media};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, uploaded_by, file_name, title, alt, caption, content_type, \
    byte_length, width, height, resize_count, upload_year, upload_month, uploaded_at, updated_at";

/// Provides CRUD operations for media rows.
pub struct MediaRepo;

impl MediaRepo {
    /// Insert a new media row, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateMedia) -> Result<Media, sqlx::Error> {
        let query = format!(
            "INSERT INTO media (uploaded_by, file_name, title, content_type, byte_length, \
                width, height, resize_count, upload_year, upload_month)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Media>(&query)
            .bind(input.uploaded_by)
            .bind(&input.file_name)
            .bind(&input.title)
            .bind(&input.content_type)
            .bind(input.byte_length)
            .bind(input.width)
            .bind(input.height)
            .bind(input.resize_count)
            .bind(input.upload_year)
            .bind(input.upload_month)
            .fetch_one(pool)
            .await
    }

    /// Find a media row by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Media>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM media WHERE id = $1");
        sqlx::query_as::<_, Media>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Paged listing, most recently uploaded first.
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Media>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM media
             ORDER BY uploaded_at DESC, id DESC
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Media>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Total media rows.
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM media")
            .fetch_one(pool)
            .await
    }

    /// Update editable metadata. Only non-`None` fields are applied.
    pub async fn update_info(
        pool: &PgPool,
        id: DbId,
        title: Option<&str>,
        alt: Option<&str>,
        caption: Option<&str>,
    ) -> Result<Option<Media>, sqlx::Error> {
        let query = format!(
            "UPDATE media SET
                title = COALESCE($2, title),
                alt = COALESCE($3, alt),
                caption = COALESCE($4, caption),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Media>(&query)
            .bind(id)
            .bind(title)
            .bind(alt)
            .bind(caption)
            .fetch_optional(pool)
            .await
    }

    /// Delete a media row by ID. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM media WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Find a media row by its year/month folder and file name (used to
    /// resolve `<img src>` URLs back to media rows).
    pub async fn find_by_folder_name(
        pool: &PgPool,
        year: i32,
        month: i32,
        file_name: &str,
    ) -> Result<Option<Media>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM media
             WHERE upload_year = $1 AND upload_month = $2 AND file_name = $3"
        );
        sqlx::query_as::<_, Media>(&query)
            .bind(year)
            .bind(month)
            .bind(file_name)
            .fetch_optional(pool)
            .await
    }

    /// Whether `file_name` already exists in the given year/month upload
    /// folder. Backs unique-filename probing.
    pub async fn file_name_exists(
        pool: &PgPool,
        year: i32,
        month: i32,
        file_name: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM media
                WHERE upload_year = $1 AND upload_month = $2 AND file_name = $3
            )",
        )
        .bind(year)
        .bind(month)
        .bind(file_name)
        .fetch_one(pool)
        .await
    }
}
