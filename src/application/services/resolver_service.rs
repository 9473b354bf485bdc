//! Redirect resolver service: the read path.
//!
//! Answers "what should happen for this id" by consulting the resolution
//! cache first and falling back to the authoritative store. Cache failures
//! degrade to store reads, never to request failures.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::domain::decision::Decision;
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;

/// Service resolving ids to redirect decisions.
///
/// All three outcomes are cached, including `Absent`; the negative TTL is
/// shorter so a freshly created id becomes resolvable quickly even after a
/// miss was cached for it.
pub struct ResolverService {
    links: Arc<dyn LinkRepository>,
    cache: Arc<dyn CacheService>,
    cache_ttl: Duration,
    negative_cache_ttl: Duration,
}

impl ResolverService {
    pub fn new(
        links: Arc<dyn LinkRepository>,
        cache: Arc<dyn CacheService>,
        cache_ttl: Duration,
        negative_cache_ttl: Duration,
    ) -> Self {
        Self {
            links,
            cache,
            cache_ttl,
            negative_cache_ttl,
        }
    }

    /// Resolves an id to a decision, consulting the cache first.
    ///
    /// A cache miss means "ask the store", never "the id is absent". The
    /// store answer is cached before returning.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unavailable`] when the store cannot be reached.
    pub async fn resolve(&self, id: &str) -> Result<Decision, AppError> {
        match self.cache.lookup(id).await {
            Ok(Some(decision)) => return Ok(decision),
            Ok(None) => {}
            Err(e) => warn!(id, error = %e, "Cache lookup failed, falling back to store"),
        }

        let decision = match self.links.get(id).await? {
            Some(link) => Decision::for_link(&link),
            None => Decision::Absent,
        };

        let ttl = if decision == Decision::Absent {
            self.negative_cache_ttl
        } else {
            self.cache_ttl
        };
        if let Err(e) = self.cache.put(id, &decision, ttl).await {
            warn!(id, error = %e, "Failed to cache decision");
        }

        Ok(decision)
    }
}
