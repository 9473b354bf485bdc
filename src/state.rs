//! Shared application state injected into handlers.

use std::sync::Arc;

use crate::application::services::{LifecycleService, ResolverService};
use crate::domain::repositories::LinkRepository;
use crate::infrastructure::cache::CacheService;

/// Application state shared across all request handlers.
///
/// Services are behind `Arc` so cloning the state per request is cheap.
#[derive(Clone)]
pub struct AppState {
    pub lifecycle_service: Arc<LifecycleService>,
    pub resolver_service: Arc<ResolverService>,
    pub links: Arc<dyn LinkRepository>,
    pub cache: Arc<dyn CacheService>,
    /// Public base URL used to render `short_url` in responses.
    pub base_url: String,
    /// `max-age` served with permanent (301/308) redirects.
    pub permanent_cache_max_age: u64,
}

impl AppState {
    /// Renders the public short URL for an id.
    pub fn short_url(&self, id: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), id)
    }
}
