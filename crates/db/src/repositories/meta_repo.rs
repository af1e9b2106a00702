//! Repository for the `meta` table: generic key → JSON value rows backing
//! navigation menus and widget placement.

use sqlx::PgPool;

use crate::models::meta::Meta;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, key, value, created_at, updated_at";

/// Provides key/value operations over the `meta` table.
pub struct MetaRepo;

impl MetaRepo {
    /// Fetch the row for `key`.
    pub async fn get(pool: &PgPool, key: &str) -> Result<Option<Meta>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM meta WHERE key = $1");
        sqlx::query_as::<_, Meta>(&query)
            .bind(key)
            .fetch_optional(pool)
            .await
    }

    /// Insert or replace the value for `key`, returning the row.
    pub async fn upsert(
        pool: &PgPool,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<Meta, sqlx::Error> {
        let query = format!(
            "INSERT INTO meta (key, value)
             VALUES ($1, $2)
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Meta>(&query)
            .bind(key)
            .bind(value)
            .fetch_one(pool)
            .await
    }

    /// Delete the row for `key`. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, key: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM meta WHERE key = $1")
            .bind(key)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List all rows whose key starts with `prefix`, ordered by key.
    pub async fn list_by_prefix(pool: &PgPool, prefix: &str) -> Result<Vec<Meta>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM meta WHERE key LIKE $1 || '%' ORDER BY key");
        sqlx::query_as::<_, Meta>(&query)
            .bind(prefix)
            .fetch_all(pool)
            .await
    }
}
