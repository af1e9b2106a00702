//! Tag models and DTOs.

use fanray_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `tags` table. `post_count` is denormalized and
/// recounted after post mutations.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Tag {
    pub id: DbId,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub post_count: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Create payload for `POST /tags`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTagRequest {
    #[validate(length(min = 1, max = 24))]
    pub title: String,
    pub slug: Option<String>,
    #[validate(length(max = 450))]
    pub description: Option<String>,
}

/// Update payload for `PUT /tags/{id}`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateTagRequest {
    #[validate(length(min = 1, max = 24))]
    pub title: Option<String>,
    pub slug: Option<String>,
    #[validate(length(max = 450))]
    pub description: Option<String>,
}
