//! Post models and DTOs.
//!
//! A post row is either a blog post (`post_type = "blog_post"`, flat,
//! belongs to a category, dated slug scope) or a page
//! (`post_type = "page"`, hierarchical via `parent_id`, sibling slug
//! scope).

use fanray_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// `post_type` discriminator for blog posts.
pub const TYPE_BLOG_POST: &str = "blog_post";

/// `post_type` discriminator for pages.
pub const TYPE_PAGE: &str = "page";

/// Draft status: visible only in the admin console.
pub const STATUS_DRAFT: &str = "draft";

/// Published status: visible on the public site.
pub const STATUS_PUBLISHED: &str = "published";

/// A row from the `posts` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Post {
    pub id: DbId,
    pub user_id: DbId,
    pub parent_id: Option<DbId>,
    pub category_id: Option<DbId>,
    pub post_type: String,
    pub status: String,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub excerpt: Option<String>,
    pub comments_enabled: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Full column set for an INSERT; the slug is already resolved to be
/// unique within its scope by the caller.
#[derive(Debug, Clone)]
pub struct CreatePostRow {
    pub user_id: DbId,
    pub parent_id: Option<DbId>,
    pub category_id: Option<DbId>,
    pub post_type: String,
    pub status: String,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub excerpt: Option<String>,
    pub comments_enabled: bool,
    /// Override the creation timestamp (MetaWeblog clients send one);
    /// `None` uses `NOW()`.
    pub created_at: Option<Timestamp>,
}

/// Full-value UPDATE input; the handler merges the request onto the
/// current row before calling the repository.
#[derive(Debug, Clone)]
pub struct UpdatePostRow {
    pub category_id: Option<DbId>,
    pub status: String,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub excerpt: Option<String>,
    pub comments_enabled: bool,
}

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Create payload for `POST /posts`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 250))]
    pub title: String,
    /// Optional user-supplied slug; derived from the title when absent.
    pub slug: Option<String>,
    #[serde(default)]
    pub body: String,
    pub excerpt: Option<String>,
    /// Category by id, or by title via `category_title` (created on demand).
    pub category_id: Option<DbId>,
    pub category_title: Option<String>,
    /// Tag titles; unknown ones are created on demand.
    #[serde(default)]
    pub tags: Vec<String>,
    /// `draft` (default) or `published`.
    pub status: Option<String>,
    pub comments_enabled: Option<bool>,
}

/// Update payload for `PUT /posts/{id}`. Absent fields keep their value.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 250))]
    pub title: Option<String>,
    pub slug: Option<String>,
    pub body: Option<String>,
    pub excerpt: Option<String>,
    pub category_id: Option<DbId>,
    pub category_title: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<String>,
    pub comments_enabled: Option<bool>,
}

/// Create payload for `POST /pages`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePageRequest {
    #[validate(length(min = 1, max = 250))]
    pub title: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub body: String,
    pub excerpt: Option<String>,
    pub parent_id: Option<DbId>,
    pub status: Option<String>,
    pub comments_enabled: Option<bool>,
}

/// Update payload for `PUT /pages/{id}`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdatePageRequest {
    #[validate(length(min = 1, max = 250))]
    pub title: Option<String>,
    pub slug: Option<String>,
    pub body: Option<String>,
    pub excerpt: Option<String>,
    pub status: Option<String>,
    pub comments_enabled: Option<bool>,
}

/// Query params for admin post listings.
#[derive(Debug, Clone, Deserialize)]
pub struct PostListParams {
    /// Filter by `draft` / `published`; absent means all.
    pub status: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    10
}

// ---------------------------------------------------------------------------
// Stats rows
// ---------------------------------------------------------------------------

/// One month of the published-post archive.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ArchiveMonth {
    pub year: i32,
    pub month: i32,
    pub count: i64,
}

/// Post totals per status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostStatusCounts {
    pub draft: i64,
    pub published: i64,
    pub total: i64,
}
