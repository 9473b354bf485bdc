//! Redis-backed cache implementation.

use super::service::{CacheError, CacheResult, CacheService};
use crate::domain::decision::Decision;
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Redis cache for resolution decisions, shared across instances.
///
/// Decisions are serialized as JSON and expired server-side via `SET EX`.
/// Uses connection pooling via `ConnectionManager` for connection reuse.
/// All operations are fail-open: errors are logged but don't propagate.
pub struct RedisCache {
    client: ConnectionManager,
    key_prefix: String,
}

impl RedisCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the
    /// connection cannot be established, or the PING health check fails.
    pub async fn connect(redis_url: &str) -> CacheResult<Self> {
        info!("Connecting to Redis at {}", redis_url);

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis");

        Ok(Self {
            client: manager,
            key_prefix: "link:".to_string(),
        })
    }

    /// Constructs the full Redis key with namespace prefix.
    fn build_key(&self, id: &str) -> String {
        format!("{}{}", self.key_prefix, id)
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn lookup(&self, id: &str) -> CacheResult<Option<Decision>> {
        let key = self.build_key(id);
        let mut conn = self.client.clone();

        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Decision>(&raw) {
                Ok(decision) => {
                    debug!("Cache HIT: {}", id);
                    Ok(Some(decision))
                }
                Err(e) => {
                    // Undecodable entry: drop it and treat as a miss.
                    warn!("Cache entry for {} is corrupt: {}", id, e);
                    let _ = conn.del::<_, i32>(&key).await;
                    Ok(None)
                }
            },
            Ok(None) => {
                debug!("Cache MISS: {}", id);
                Ok(None)
            }
            Err(e) => {
                error!("Redis GET error for {}: {}", id, e);
                Ok(None)
            }
        }
    }

    async fn put(&self, id: &str, decision: &Decision, ttl: Duration) -> CacheResult<()> {
        let key = self.build_key(id);
        let mut conn = self.client.clone();

        let raw = serde_json::to_string(decision)
            .map_err(|e| CacheError::OperationError(e.to_string()))?;
        let ttl_seconds = ttl.as_secs().max(1);

        match conn.set_ex::<_, _, ()>(&key, raw, ttl_seconds).await {
            Ok(_) => {
                debug!("Cache SET: {} (TTL: {}s)", id, ttl_seconds);
                Ok(())
            }
            Err(e) => {
                warn!("Redis SET error for {}: {}", id, e);
                Ok(())
            }
        }
    }

    async fn invalidate(&self, id: &str) -> CacheResult<()> {
        let key = self.build_key(id);
        let mut conn = self.client.clone();

        match conn.del::<_, i32>(&key).await {
            Ok(deleted) => {
                if deleted > 0 {
                    debug!("Cache INVALIDATE: {}", id);
                }
                Ok(())
            }
            Err(e) => {
                warn!("Redis DEL error for {}: {}", id, e);
                Ok(())
            }
        }
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
