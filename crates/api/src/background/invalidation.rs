//! Event-driven cache invalidation.
//!
//! Subscribes to the event bus and removes the cache entries a mutation
//! makes stale. Runs alongside event persistence as a background task
//! and shuts down when the bus sender is dropped.

use std::sync::Arc;

use fanray_cache::{keys, Cache};
use fanray_events::SiteEvent;
use tokio::sync::broadcast;

/// Background service that maps events to cache removals.
pub struct CacheInvalidator;

impl CacheInvalidator {
    /// Run the invalidation loop until the bus closes.
    pub async fn run(cache: Arc<dyn Cache>, mut receiver: broadcast::Receiver<SiteEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => Self::invalidate(cache.as_ref(), &event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    // Missed events mean unknown staleness; drop everything.
                    tracing::warn!(skipped = n, "Cache invalidator lagged, clearing all lists");
                    cache.remove_prefix("").await;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, cache invalidator shutting down");
                    break;
                }
            }
        }
    }

    /// Remove the entries affected by one event.
    async fn invalidate(cache: &dyn Cache, event: &SiteEvent) {
        let event_type = event.event_type.as_str();
        let domain = event_type.split('.').next().unwrap_or("");

        match domain {
            // Post mutations stale the index pages, the archive, and the
            // taxonomy counts shown next to category/tag names.
            "post" => {
                cache.remove_prefix(keys::POST_INDEX_PREFIX).await;
                cache.remove(keys::ARCHIVES).await;
                cache.remove(keys::CATEGORIES).await;
                cache.remove(keys::TAGS).await;
            }
            "category" => {
                cache.remove(keys::CATEGORIES).await;
            }
            "tag" => {
                cache.remove(keys::TAGS).await;
            }
            _ => {}
        }
        tracing::debug!(event_type, "Cache invalidation processed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fanray_cache::MemoryCache;
    use std::time::Duration;

    async fn seeded_cache() -> MemoryCache {
        let cache = MemoryCache::new();
        let ttl = Duration::from_secs(60);
        cache
            .put(keys::CATEGORIES, serde_json::json!([1]), ttl)
            .await;
        cache.put(keys::TAGS, serde_json::json!([2]), ttl).await;
        cache.put(keys::ARCHIVES, serde_json::json!([3]), ttl).await;
        cache
            .put(&keys::post_index(1), serde_json::json!([4]), ttl)
            .await;
        cache
    }

    #[tokio::test]
    async fn post_events_clear_everything() {
        let cache = seeded_cache().await;
        CacheInvalidator::invalidate(&cache, &SiteEvent::new("post.created")).await;

        assert!(cache.get(&keys::post_index(1)).await.is_none());
        assert!(cache.get(keys::ARCHIVES).await.is_none());
        assert!(cache.get(keys::CATEGORIES).await.is_none());
        assert!(cache.get(keys::TAGS).await.is_none());
    }

    #[tokio::test]
    async fn category_events_only_clear_categories() {
        let cache = seeded_cache().await;
        CacheInvalidator::invalidate(&cache, &SiteEvent::new("category.updated")).await;

        assert!(cache.get(keys::CATEGORIES).await.is_none());
        assert!(cache.get(keys::TAGS).await.is_some());
        assert!(cache.get(&keys::post_index(1)).await.is_some());
    }

    #[tokio::test]
    async fn unrelated_events_clear_nothing() {
        let cache = seeded_cache().await;
        CacheInvalidator::invalidate(&cache, &SiteEvent::new("media.uploaded")).await;

        assert!(cache.get(keys::CATEGORIES).await.is_some());
        assert!(cache.get(keys::TAGS).await.is_some());
        assert!(cache.get(keys::ARCHIVES).await.is_some());
    }

    #[tokio::test]
    async fn loop_exits_when_bus_drops() {
        let bus = fanray_events::EventBus::default();
        let rx = bus.subscribe();
        let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());

        let handle = tokio::spawn(CacheInvalidator::run(cache, rx));
        bus.publish(SiteEvent::new("post.created"));
        drop(bus);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("invalidator should shut down")
            .expect("task should not panic");
    }
}
