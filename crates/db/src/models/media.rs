//! Media models and DTOs.

use fanray_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `media` table, describing one uploaded image.
///
/// `resize_count` records how many derivative sizes were generated at
/// upload time (0–4, always the smallest N of the ladder); it drives the
/// derivative decision table when serving.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Media {
    pub id: DbId,
    pub uploaded_by: DbId,
    pub file_name: String,
    pub title: String,
    pub alt: Option<String>,
    pub caption: Option<String>,
    pub content_type: String,
    pub byte_length: i64,
    pub width: i32,
    pub height: i32,
    pub resize_count: i32,
    pub upload_year: i32,
    pub upload_month: i32,
    pub uploaded_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Full column set for an INSERT; the file name is already resolved to
/// be unique within its year/month folder.
#[derive(Debug, Clone)]
pub struct CreateMedia {
    pub uploaded_by: DbId,
    pub file_name: String,
    pub title: String,
    pub content_type: String,
    pub byte_length: i64,
    pub width: i32,
    pub height: i32,
    pub resize_count: i32,
    pub upload_year: i32,
    pub upload_month: i32,
}

/// Update payload for `PUT /media/{id}`, the editable metadata only.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateMediaRequest {
    #[validate(length(max = 250))]
    pub title: Option<String>,
    #[validate(length(max = 250))]
    pub alt: Option<String>,
    pub caption: Option<String>,
}

/// Query params for paged media listings.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaListParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    50
}
