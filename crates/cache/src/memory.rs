//! In-memory [`Cache`] implementation.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::Cache;

struct Entry {
    value: serde_json::Value,
    expires_at: Instant,
}

/// Process-local cache backed by a `HashMap` behind an async `RwLock`.
///
/// The default provider for single-instance deployments; multi-instance
/// setups swap in a distributed implementation of [`Cache`].
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Option<serde_json::Value> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }
        // Expired: drop it so the map does not accumulate dead entries.
        self.entries.write().await.remove(key);
        None
    }

    async fn put(&self, key: &str, value: serde_json::Value, ttl: Duration) {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);
    }

    async fn remove(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    async fn remove_prefix(&self, prefix: &str) {
        self.entries
            .write()
            .await
            .retain(|key, _| !key.starts_with(prefix));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{get_json, put_json};

    #[tokio::test]
    async fn put_then_get_returns_value() {
        let cache = MemoryCache::new();
        cache
            .put("k", serde_json::json!({"a": 1}), Duration::from_secs(60))
            .await;

        let value = cache.get("k").await.expect("entry should be live");
        assert_eq!(value["a"], 1);
    }

    #[tokio::test]
    async fn expired_entries_are_misses() {
        let cache = MemoryCache::new();
        cache
            .put("k", serde_json::json!(1), Duration::from_millis(10))
            .await;

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn remove_deletes_entry() {
        let cache = MemoryCache::new();
        cache
            .put("k", serde_json::json!(1), Duration::from_secs(60))
            .await;
        cache.remove("k").await;
        assert!(cache.get("k").await.is_none());

        // Removing again is a no-op.
        cache.remove("k").await;
    }

    #[tokio::test]
    async fn remove_prefix_clears_matching_keys() {
        let cache = MemoryCache::new();
        for page in 1..=3u32 {
            cache
                .put(
                    &crate::keys::post_index(page),
                    serde_json::json!(page),
                    Duration::from_secs(60),
                )
                .await;
        }
        cache
            .put("other", serde_json::json!(true), Duration::from_secs(60))
            .await;

        cache.remove_prefix(crate::keys::POST_INDEX_PREFIX).await;

        assert!(cache.get(&crate::keys::post_index(1)).await.is_none());
        assert!(cache.get("other").await.is_some());
    }

    #[tokio::test]
    async fn typed_helpers_round_trip() {
        let cache = MemoryCache::new();
        put_json(&cache, "nums", &vec![1, 2, 3], Duration::from_secs(60)).await;

        let nums: Vec<i32> = get_json(&cache, "nums").await.expect("should deserialize");
        assert_eq!(nums, vec![1, 2, 3]);

        // Wrong target type is treated as a miss and evicts the entry.
        let miss: Option<String> = get_json(&cache, "nums").await;
        assert!(miss.is_none());
        assert!(cache.get("nums").await.is_none());
    }
}
