#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tinylink::application::services::{LifecycleService, ResolverService, TokenService};
use tinylink::domain::repositories::LinkRepository;
use tinylink::infrastructure::cache::{CacheService, MemoryCache};
use tinylink::infrastructure::persistence::MemoryLinkRepository;
use tinylink::state::AppState;

pub const TEST_BASE_URL: &str = "https://sho.rt";

/// Builds an application state backed by in-memory store and cache.
///
/// The decision cache gets a generous TTL so tests exercise explicit
/// invalidation rather than entry expiry.
pub fn create_test_state() -> AppState {
    create_test_state_with_rotation(false)
}

pub fn create_test_state_with_rotation(rotate_token_on_update: bool) -> AppState {
    let links: Arc<dyn LinkRepository> = Arc::new(MemoryLinkRepository::new());
    let cache: Arc<dyn CacheService> = Arc::new(MemoryCache::default());
    let tokens = Arc::new(TokenService::new("test-pepper".to_string()));

    let cache_ttl = Duration::from_secs(60);
    let negative_cache_ttl = Duration::from_secs(60);

    AppState {
        lifecycle_service: Arc::new(LifecycleService::new(
            links.clone(),
            cache.clone(),
            tokens,
            rotate_token_on_update,
            cache_ttl,
        )),
        resolver_service: Arc::new(ResolverService::new(
            links.clone(),
            cache.clone(),
            cache_ttl,
            negative_cache_ttl,
        )),
        links,
        cache,
        base_url: TEST_BASE_URL.to_string(),
        permanent_cache_max_age: 86_400,
    }
}
