//! Pluggable read-mostly cache for the Fanray API.
//!
//! Read-heavy lists (post index pages, categories, tags, archives) are
//! cached behind the [`Cache`] trait so deployments can swap the in-memory
//! default for a distributed store. Invalidation is best-effort
//! remove-on-write: mutations publish events and a background listener
//! removes the affected keys. There is no versioning or guarantee
//! against concurrent readers.

pub mod keys;
pub mod memory;

pub use memory::MemoryCache;

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A pluggable cache of JSON values with per-entry TTLs.
#[async_trait::async_trait]
pub trait Cache: Send + Sync {
    /// Fetch a live (non-expired) entry.
    async fn get(&self, key: &str) -> Option<serde_json::Value>;

    /// Store an entry, replacing any previous value for the key.
    async fn put(&self, key: &str, value: serde_json::Value, ttl: Duration);

    /// Remove an entry. Removing a missing key is a no-op.
    async fn remove(&self, key: &str);

    /// Remove every entry whose key starts with `prefix` (used for paged
    /// listings where the page count is unknown to the invalidator).
    async fn remove_prefix(&self, prefix: &str);
}

/// Fetch and deserialize a cached value. Entries that fail to
/// deserialize (stale shape after a deploy) are treated as misses.
pub async fn get_json<T: DeserializeOwned>(cache: &dyn Cache, key: &str) -> Option<T> {
    let value = cache.get(key).await?;
    match serde_json::from_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(key, error = %e, "Discarding undeserializable cache entry");
            cache.remove(key).await;
            None
        }
    }
}

/// Serialize and store a value. Serialization failures are logged and
/// skipped; callers always have the database result in hand.
pub async fn put_json<T: Serialize>(cache: &dyn Cache, key: &str, value: &T, ttl: Duration) {
    match serde_json::to_value(value) {
        Ok(v) => cache.put(key, v, ttl).await,
        Err(e) => tracing::warn!(key, error = %e, "Failed to serialize cache entry"),
    }
}
