//! In-process cache implementation backed by moka.

use super::service::{CacheResult, CacheService};
use crate::domain::decision::Decision;
use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Clone)]
struct Entry {
    decision: Decision,
    ttl: Duration,
}

/// Expires each entry after the TTL it was stored with.
struct PerEntryExpiry;

impl Expiry<String, Entry> for PerEntryExpiry {
    fn expire_after_create(&self, _key: &String, value: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process decision cache with per-entry TTL.
///
/// Suitable for single-instance deployments and tests. Unlike
/// [`super::RedisCache`] it is not shared between processes, so a
/// multi-instance deployment would serve stale decisions up to the TTL after
/// a write on another instance. That is within the accepted staleness bound, but
/// without the push-invalidation benefit.
pub struct MemoryCache {
    entries: Cache<String, Entry>,
}

impl MemoryCache {
    /// Creates a cache holding at most `max_capacity` decisions.
    pub fn new(max_capacity: u64) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(max_capacity)
                .expire_after(PerEntryExpiry)
                .build(),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn lookup(&self, id: &str) -> CacheResult<Option<Decision>> {
        Ok(self.entries.get(id).await.map(|e| e.decision))
    }

    async fn put(&self, id: &str, decision: &Decision, ttl: Duration) -> CacheResult<()> {
        self.entries
            .insert(
                id.to_string(),
                Entry {
                    decision: decision.clone(),
                    ttl,
                },
            )
            .await;
        Ok(())
    }

    async fn invalidate(&self, id: &str) -> CacheResult<()> {
        self.entries.invalidate(id).await;
        debug!("Cache INVALIDATE: {}", id);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::RedirectCode;

    fn redirect() -> Decision {
        Decision::Redirect {
            target_url: "https://example.com/".to_string(),
            code: RedirectCode::MovedPermanently,
        }
    }

    #[tokio::test]
    async fn test_put_then_lookup() {
        let cache = MemoryCache::default();
        cache
            .put("abc123", &redirect(), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(cache.lookup("abc123").await.unwrap(), Some(redirect()));
    }

    #[tokio::test]
    async fn test_lookup_miss() {
        let cache = MemoryCache::default();
        assert_eq!(cache.lookup("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalidate_removes_entry() {
        let cache = MemoryCache::default();
        cache
            .put("abc123", &Decision::Gone, Duration::from_secs(5))
            .await
            .unwrap();
        cache.invalidate("abc123").await.unwrap();

        assert_eq!(cache.lookup("abc123").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let cache = MemoryCache::default();
        cache
            .put("abc123", &redirect(), Duration::from_secs(5))
            .await
            .unwrap();
        cache
            .put("abc123", &Decision::Gone, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(cache.lookup("abc123").await.unwrap(), Some(Decision::Gone));
    }
}
