//! Cache service trait and error types.

use crate::domain::decision::Decision;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// Errors that can occur during cache operations.
#[derive(Debug)]
pub enum CacheError {
    ConnectionError(String),
    OperationError(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Cache connection error: {}", e),
            Self::OperationError(e) => write!(f, "Cache operation error: {}", e),
        }
    }
}

impl std::error::Error for CacheError {}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Trait for the id → resolution-decision cache.
///
/// The cache is a best-effort accelerator in front of the link store. A miss
/// is never evidence of non-existence; callers must fall through to the
/// store. Entries are time-bounded by the TTL passed to [`Self::put`], which
/// bounds staleness when an invalidation is lost; the write path additionally
/// invalidates affected ids eagerly (push model).
///
/// Implementations must be thread-safe and fail open: cache trouble degrades
/// to store lookups, it never fails a request.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed, shared
/// - [`crate::infrastructure::cache::MemoryCache`] - in-process (moka)
/// - [`crate::infrastructure::cache::NullCache`] - caching disabled
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Looks up the cached decision for an id.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(decision))` on cache hit
    /// - `Ok(None)` on cache miss or error (fail-open behavior)
    async fn lookup(&self, id: &str) -> CacheResult<Option<Decision>>;

    /// Stores a decision with the given TTL.
    ///
    /// Negative decisions ([`Decision::Absent`]) should be stored with a
    /// shorter TTL than positive ones to bound poisoning from probing.
    ///
    /// # Errors
    ///
    /// Implementations should log errors and return `Ok(())` to avoid
    /// disrupting the request flow.
    async fn put(&self, id: &str, decision: &Decision, ttl: Duration) -> CacheResult<()>;

    /// Removes the cached decision for an id.
    ///
    /// Called by the write path after every successful mutation.
    async fn invalidate(&self, id: &str) -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;
}
