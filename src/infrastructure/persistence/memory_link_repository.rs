//! In-memory implementation of the link repository.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::entities::{Link, LinkPatch, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

/// In-process link store for tests and single-instance development.
///
/// Uniqueness is enforced by the map entry under a single write lock, which
/// gives the same atomic check-and-insert semantics as the PostgreSQL primary
/// key within one process. Not suitable when multiple instances run: there is
/// no shared registry, so concurrent generators in different processes could
/// both succeed with the same id.
#[derive(Default)]
pub struct MemoryLinkRepository {
    links: RwLock<HashMap<String, Link>>,
}

impl MemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LinkRepository for MemoryLinkRepository {
    async fn insert(&self, new_link: NewLink) -> Result<Link, AppError> {
        let mut links = self.links.write().await;

        if links.contains_key(&new_link.id) {
            return Err(AppError::conflict(
                "Id already taken",
                json!({ "id": new_link.id }),
            ));
        }

        let now = Utc::now();
        let link = Link {
            id: new_link.id.clone(),
            target_url: new_link.target_url,
            redirect_code: new_link.redirect_code,
            created_at: now,
            updated_at: now,
            edit_token_hash: new_link.edit_token_hash,
            active: true,
            expires_at: new_link.expires_at,
        };

        links.insert(new_link.id, link.clone());
        Ok(link)
    }

    async fn get(&self, id: &str) -> Result<Option<Link>, AppError> {
        Ok(self.links.read().await.get(id).cloned())
    }

    async fn update(
        &self,
        id: &str,
        expected_token_hash: &str,
        patch: LinkPatch,
    ) -> Result<Link, AppError> {
        let mut links = self.links.write().await;

        let link = links
            .get_mut(id)
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "id": id })))?;

        if !link.active || link.edit_token_hash != expected_token_hash {
            return Err(AppError::forbidden(
                "Invalid edit token",
                json!({ "id": id }),
            ));
        }

        if let Some(target_url) = patch.target_url {
            link.target_url = target_url;
        }
        if let Some(code) = patch.redirect_code {
            link.redirect_code = code;
        }
        if let Some(expires_at) = patch.expires_at {
            link.expires_at = expires_at;
        }
        if let Some(hash) = patch.edit_token_hash {
            link.edit_token_hash = hash;
        }
        link.updated_at = Utc::now();

        Ok(link.clone())
    }

    async fn retire(&self, id: &str, expected_token_hash: &str) -> Result<bool, AppError> {
        let mut links = self.links.write().await;

        let link = links
            .get_mut(id)
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "id": id })))?;

        if link.edit_token_hash != expected_token_hash {
            return Err(AppError::forbidden(
                "Invalid edit token",
                json!({ "id": id }),
            ));
        }

        if !link.active {
            return Ok(false);
        }

        link.active = false;
        link.updated_at = Utc::now();
        Ok(true)
    }

    async fn change_alias(&self, old_id: &str, new_id: &str) -> Result<Link, AppError> {
        let mut links = self.links.write().await;

        if links.contains_key(new_id) {
            return Err(AppError::conflict(
                "Id already taken",
                json!({ "id": new_id }),
            ));
        }

        let old = links
            .get_mut(old_id)
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "id": old_id })))?;

        old.active = false;
        old.updated_at = Utc::now();

        let new_link = Link {
            id: new_id.to_string(),
            target_url: old.target_url.clone(),
            redirect_code: old.redirect_code,
            created_at: old.created_at,
            updated_at: Utc::now(),
            edit_token_hash: old.edit_token_hash.clone(),
            active: true,
            expires_at: old.expires_at,
        };

        links.insert(new_id.to_string(), new_link.clone());
        Ok(new_link)
    }

    async fn health_check(&self) -> bool {
        true
    }
}
