//! Well-known cache keys and TTLs for read-mostly lists.

use std::time::Duration;

/// Full category list.
pub const CATEGORIES: &str = "blog.categories";

/// Full tag list.
pub const TAGS: &str = "blog.tags";

/// Archive month counts.
pub const ARCHIVES: &str = "blog.archives";

/// Prefix for paged published-post listings; the page number is appended.
pub const POST_INDEX_PREFIX: &str = "blog.posts.index.";

/// Key for one page of the published-post index.
pub fn post_index(page: u32) -> String {
    format!("{POST_INDEX_PREFIX}{page}")
}

/// Post index pages turn over on every publish; keep them short-lived.
pub const POST_INDEX_TTL: Duration = Duration::from_secs(10 * 60);

/// Taxonomy and archive lists change rarely.
pub const LIST_TTL: Duration = Duration::from_secs(8 * 60 * 60);
