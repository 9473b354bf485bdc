//! Link lifecycle service: the write path.
//!
//! Orchestrates id allocation, token issuance, the durable store write and
//! cache invalidation for create, update and delete. The store insert is the
//! durability point; success is only reported after it commits.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::warn;

use crate::application::services::TokenService;
use crate::domain::decision::Decision;
use crate::domain::entities::{Link, LinkPatch, NewLink, RedirectCode};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;
use crate::utils::id_generator::{generate_id, normalize_id, validate_custom_id};
use crate::utils::url_normalizer::normalize_url;

/// Collision budget for generated ids. Exceeding it signals namespace
/// pressure and surfaces as a server error, not a client error.
const MAX_GENERATE_ATTEMPTS: usize = 5;

/// Requested changes for an existing link.
///
/// `new_id` triggers an alias change: a new record under `new_id` plus
/// retirement of the old id, never a rename in place.
#[derive(Debug, Clone, Default)]
pub struct LinkChanges {
    pub target_url: Option<String>,
    pub redirect_code: Option<RedirectCode>,
    pub new_id: Option<String>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

/// Result of a successful update.
///
/// `rotated_token` carries the replacement plaintext when token rotation is
/// enabled; it is returned exactly once and never persisted.
#[derive(Debug, Clone)]
pub struct UpdatedLink {
    pub link: Link,
    pub rotated_token: Option<String>,
}

/// Service orchestrating the link write path.
///
/// State machine per id: `nonexistent -> active -> retired` (terminal).
/// Every mutating call verifies the edit token before touching the store,
/// and invalidates the resolution cache for affected ids after the store
/// write commits.
pub struct LifecycleService {
    links: Arc<dyn LinkRepository>,
    cache: Arc<dyn CacheService>,
    tokens: Arc<TokenService>,
    rotate_on_update: bool,
    cache_ttl: Duration,
}

impl LifecycleService {
    pub fn new(
        links: Arc<dyn LinkRepository>,
        cache: Arc<dyn CacheService>,
        tokens: Arc<TokenService>,
        rotate_on_update: bool,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            links,
            cache,
            tokens,
            rotate_on_update,
            cache_ttl,
        }
    }

    /// Creates a new link and returns it with the plaintext edit token.
    ///
    /// With a requested id, a single insert attempt decides the outcome; the
    /// store's uniqueness constraint is the arbiter, so concurrent creators
    /// of the same id cannot both succeed. Without one, random 6-hex ids are
    /// tried until the collision budget is spent.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for a bad URL, id or redirect code,
    /// [`AppError::Conflict`] when the requested id is taken (active or
    /// retired), and [`AppError::Exhausted`] when generation keeps colliding.
    pub async fn create(
        &self,
        target_url: String,
        requested_id: Option<String>,
        redirect_code: RedirectCode,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(Link, String), AppError> {
        let target_url = normalize_url(&target_url).map_err(|e| {
            AppError::bad_request("Invalid target URL", json!({ "reason": e.to_string() }))
        })?;

        let token = self.tokens.issue();

        let link = match requested_id {
            Some(raw) => {
                let id = normalize_id(&raw);
                validate_custom_id(&id)?;

                self.links
                    .insert(NewLink {
                        id,
                        target_url,
                        redirect_code,
                        edit_token_hash: token.hash,
                        expires_at,
                    })
                    .await?
            }
            None => {
                self.insert_generated(target_url, redirect_code, token.hash, expires_at)
                    .await?
            }
        };

        // Prime the cache so the first redirect after create is a hit.
        self.prime(&link).await;

        Ok((link, token.plaintext))
    }

    /// Updates a link after verifying the edit token.
    ///
    /// Plain field changes mutate the record in place; a `new_id` routes
    /// through the alias-change transaction and invalidates both ids. The
    /// token check happens before any store mutation, so a rejected request
    /// has no side effects.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`], [`AppError::Forbidden`] for a wrong
    /// token, [`AppError::Gone`] when the link is already retired,
    /// [`AppError::Conflict`] when `new_id` is taken, and
    /// [`AppError::Validation`] for bad inputs or an empty change set.
    pub async fn update(
        &self,
        id: &str,
        token: &str,
        changes: LinkChanges,
    ) -> Result<UpdatedLink, AppError> {
        let link = self.fetch_verified(id, token).await?;

        if link.is_retired() {
            return Err(AppError::gone(
                "Link has been retired",
                json!({ "id": id }),
            ));
        }

        let target_url = changes
            .target_url
            .map(|raw| {
                normalize_url(&raw).map_err(|e| {
                    AppError::bad_request("Invalid target URL", json!({ "reason": e.to_string() }))
                })
            })
            .transpose()?;

        let rotation = self.rotate_on_update.then(|| self.tokens.issue());
        let patch = LinkPatch {
            target_url,
            redirect_code: changes.redirect_code,
            expires_at: changes.expires_at,
            edit_token_hash: rotation.as_ref().map(|t| t.hash.clone()),
        };

        let updated = match changes.new_id {
            Some(raw) => {
                let new_id = normalize_id(&raw);
                validate_custom_id(&new_id)?;

                let moved = self.links.change_alias(&link.id, &new_id).await?;
                let updated = if patch.is_empty() {
                    moved
                } else {
                    self.links
                        .update(&new_id, &moved.edit_token_hash, patch)
                        .await?
                };

                // Old id now resolves Gone, new id resolves fresh.
                self.invalidate(&link.id).await;
                self.invalidate(&new_id).await;
                updated
            }
            None => {
                if patch.is_empty() {
                    return Err(AppError::bad_request(
                        "Nothing to update",
                        json!({ "id": id }),
                    ));
                }

                let updated = self
                    .links
                    .update(&link.id, &link.edit_token_hash, patch)
                    .await?;
                self.invalidate(&link.id).await;
                updated
            }
        };

        Ok(UpdatedLink {
            link: updated,
            rotated_token: rotation.map(|t| t.plaintext),
        })
    }

    /// Soft-deletes a link after verifying the edit token.
    ///
    /// Retirement is terminal: the id stays in the key space forever and
    /// subsequent resolutions return `Gone`. Deleting an already-retired
    /// link is idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] or [`AppError::Forbidden`].
    pub async fn delete(&self, id: &str, token: &str) -> Result<(), AppError> {
        let link = self.fetch_verified(id, token).await?;

        self.links.retire(&link.id, &link.edit_token_hash).await?;
        self.invalidate(&link.id).await;

        Ok(())
    }

    /// Fetches a link and verifies the edit token against its stored hash.
    ///
    /// Verification is constant-time and precedes every mutation.
    async fn fetch_verified(&self, id: &str, token: &str) -> Result<Link, AppError> {
        let link = self
            .links
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "id": id })))?;

        if !self.tokens.verify(token, &link.edit_token_hash) {
            return Err(AppError::forbidden(
                "Invalid edit token",
                json!({ "id": id }),
            ));
        }

        Ok(link)
    }

    /// Inserts with generated ids, retrying on collision.
    async fn insert_generated(
        &self,
        target_url: String,
        redirect_code: RedirectCode,
        edit_token_hash: String,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Link, AppError> {
        for attempt in 1..=MAX_GENERATE_ATTEMPTS {
            let candidate = generate_id();

            match self
                .links
                .insert(NewLink {
                    id: candidate.clone(),
                    target_url: target_url.clone(),
                    redirect_code,
                    edit_token_hash: edit_token_hash.clone(),
                    expires_at,
                })
                .await
            {
                Ok(link) => return Ok(link),
                Err(AppError::Conflict { .. }) => {
                    warn!(candidate, attempt, "Generated id collided, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::exhausted(
            "Failed to allocate a unique id",
            json!({ "attempts": MAX_GENERATE_ATTEMPTS }),
        ))
    }

    async fn prime(&self, link: &Link) {
        let decision = Decision::for_link(link);
        if let Err(e) = self.cache.put(&link.id, &decision, self.cache_ttl).await {
            warn!(id = %link.id, error = %e, "Failed to prime cache");
        }
    }

    async fn invalidate(&self, id: &str) {
        if let Err(e) = self.cache.invalidate(id).await {
            warn!(id, error = %e, "Failed to invalidate cache");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockLinkRepository;
    use crate::infrastructure::cache::{MemoryCache, NullCache};
    use mockall::predicate::eq;

    fn tokens() -> Arc<TokenService> {
        Arc::new(TokenService::new("test-pepper".to_string()))
    }

    fn link_from(new_link: &NewLink) -> Link {
        let now = Utc::now();
        Link {
            id: new_link.id.clone(),
            target_url: new_link.target_url.clone(),
            redirect_code: new_link.redirect_code,
            created_at: now,
            updated_at: now,
            edit_token_hash: new_link.edit_token_hash.clone(),
            active: true,
            expires_at: new_link.expires_at,
        }
    }

    fn service(repo: MockLinkRepository, cache: Arc<dyn CacheService>) -> LifecycleService {
        LifecycleService::new(Arc::new(repo), cache, tokens(), false, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_create_with_generated_id() {
        let mut repo = MockLinkRepository::new();
        repo.expect_insert()
            .times(1)
            .returning(|nl| Ok(link_from(&nl)));

        let svc = service(repo, Arc::new(NullCache));
        let (link, token) = svc
            .create("https://example.com".to_string(), None, RedirectCode::MovedPermanently, None)
            .await
            .unwrap();

        assert_eq!(link.id.len(), 6);
        assert!(link.id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(token.len(), 24);
        assert_eq!(link.target_url, "https://example.com/");
    }

    #[tokio::test]
    async fn test_create_normalizes_punycode_host() {
        let mut repo = MockLinkRepository::new();
        repo.expect_insert()
            .withf(|nl| nl.target_url == "https://xn--r8jz45g.jp/path")
            .times(1)
            .returning(|nl| Ok(link_from(&nl)));

        let svc = service(repo, Arc::new(NullCache));
        let (link, _) = svc
            .create("https://例え.jp/path".to_string(), None, RedirectCode::Found, None)
            .await
            .unwrap();

        assert!(link.target_url.is_ascii());
    }

    #[tokio::test]
    async fn test_create_with_custom_id_lowercases() {
        let mut repo = MockLinkRepository::new();
        repo.expect_insert()
            .withf(|nl| nl.id == "mylink")
            .times(1)
            .returning(|nl| Ok(link_from(&nl)));

        let svc = service(repo, Arc::new(NullCache));
        let (link, _) = svc
            .create(
                "https://example.com".to_string(),
                Some("MyLink".to_string()),
                RedirectCode::MovedPermanently,
                None,
            )
            .await
            .unwrap();

        assert_eq!(link.id, "mylink");
    }

    #[tokio::test]
    async fn test_create_rejects_javascript_scheme() {
        let mut repo = MockLinkRepository::new();
        repo.expect_insert().times(0);

        let svc = service(repo, Arc::new(NullCache));
        let err = svc
            .create(
                "javascript:alert(1)".to_string(),
                None,
                RedirectCode::MovedPermanently,
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_create_custom_id_conflict_propagates() {
        let mut repo = MockLinkRepository::new();
        repo.expect_insert()
            .times(1)
            .returning(|nl| Err(AppError::conflict("Id already taken", json!({ "id": nl.id }))));

        let svc = service(repo, Arc::new(NullCache));
        let err = svc
            .create(
                "https://example.com".to_string(),
                Some("taken".to_string()),
                RedirectCode::MovedPermanently,
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_generated_id_collisions_exhaust_budget() {
        let mut repo = MockLinkRepository::new();
        repo.expect_insert()
            .times(MAX_GENERATE_ATTEMPTS)
            .returning(|nl| Err(AppError::conflict("Id already taken", json!({ "id": nl.id }))));

        let svc = service(repo, Arc::new(NullCache));
        let err = svc
            .create(
                "https://example.com".to_string(),
                None,
                RedirectCode::MovedPermanently,
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Exhausted { .. }));
    }

    #[tokio::test]
    async fn test_create_primes_cache() {
        let mut repo = MockLinkRepository::new();
        repo.expect_insert()
            .times(1)
            .returning(|nl| Ok(link_from(&nl)));

        let cache = Arc::new(MemoryCache::default());
        let svc = service(repo, cache.clone());
        let (link, _) = svc
            .create(
                "https://example.com".to_string(),
                Some("primed".to_string()),
                RedirectCode::Found,
                None,
            )
            .await
            .unwrap();

        let cached = cache.lookup(&link.id).await.unwrap();
        assert_eq!(
            cached,
            Some(Decision::Redirect {
                target_url: "https://example.com/".to_string(),
                code: RedirectCode::Found,
            })
        );
    }

    #[tokio::test]
    async fn test_update_wrong_token_touches_nothing() {
        let authority = tokens();
        let stored_hash = authority.hash("correct-token");

        let mut repo = MockLinkRepository::new();
        repo.expect_get()
            .with(eq("abc123"))
            .times(1)
            .returning(move |id| {
                Ok(Some(link_from(&NewLink {
                    id: id.to_string(),
                    target_url: "https://example.com/".to_string(),
                    redirect_code: RedirectCode::MovedPermanently,
                    edit_token_hash: stored_hash.clone(),
                    expires_at: None,
                })))
            });
        repo.expect_update().times(0);
        repo.expect_change_alias().times(0);

        let svc = LifecycleService::new(
            Arc::new(repo),
            Arc::new(NullCache),
            authority,
            false,
            Duration::from_secs(5),
        );

        let err = svc
            .update(
                "abc123",
                "wrong-token",
                LinkChanges {
                    target_url: Some("https://evil.example/".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_update_invalidates_cache_entry() {
        let authority = tokens();
        let stored_hash = authority.hash("tok");
        let hash_for_get = stored_hash.clone();
        let hash_for_update = stored_hash.clone();

        let mut repo = MockLinkRepository::new();
        repo.expect_get().times(1).returning(move |id| {
            Ok(Some(link_from(&NewLink {
                id: id.to_string(),
                target_url: "https://example.com/".to_string(),
                redirect_code: RedirectCode::MovedPermanently,
                edit_token_hash: hash_for_get.clone(),
                expires_at: None,
            })))
        });
        repo.expect_update()
            .times(1)
            .returning(move |id, _, patch| {
                let mut link = link_from(&NewLink {
                    id: id.to_string(),
                    target_url: patch.target_url.unwrap(),
                    redirect_code: RedirectCode::MovedPermanently,
                    edit_token_hash: hash_for_update.clone(),
                    expires_at: None,
                });
                link.updated_at = Utc::now();
                Ok(link)
            });

        let cache = Arc::new(MemoryCache::default());
        cache
            .put(
                "abc123",
                &Decision::Redirect {
                    target_url: "https://example.com/".to_string(),
                    code: RedirectCode::MovedPermanently,
                },
                Duration::from_secs(60),
            )
            .await
            .unwrap();

        let svc = LifecycleService::new(
            Arc::new(repo),
            cache.clone(),
            authority,
            false,
            Duration::from_secs(5),
        );

        let updated = svc
            .update(
                "abc123",
                "tok",
                LinkChanges {
                    target_url: Some("https://example.org/new".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.link.target_url, "https://example.org/new");
        assert!(updated.rotated_token.is_none());
        assert_eq!(cache.lookup("abc123").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_empty_changes_rejected() {
        let authority = tokens();
        let stored_hash = authority.hash("tok");

        let mut repo = MockLinkRepository::new();
        repo.expect_get().times(1).returning(move |id| {
            Ok(Some(link_from(&NewLink {
                id: id.to_string(),
                target_url: "https://example.com/".to_string(),
                redirect_code: RedirectCode::MovedPermanently,
                edit_token_hash: stored_hash.clone(),
                expires_at: None,
            })))
        });
        repo.expect_update().times(0);

        let svc = LifecycleService::new(
            Arc::new(repo),
            Arc::new(NullCache),
            authority,
            false,
            Duration::from_secs(5),
        );

        let err = svc
            .update("abc123", "tok", LinkChanges::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_update_rotation_returns_new_token() {
        let authority = tokens();
        let stored_hash = authority.hash("old-token");
        let hash_for_get = stored_hash.clone();

        let mut repo = MockLinkRepository::new();
        repo.expect_get().times(1).returning(move |id| {
            Ok(Some(link_from(&NewLink {
                id: id.to_string(),
                target_url: "https://example.com/".to_string(),
                redirect_code: RedirectCode::MovedPermanently,
                edit_token_hash: hash_for_get.clone(),
                expires_at: None,
            })))
        });
        repo.expect_update()
            .withf(|_, _, patch| patch.edit_token_hash.is_some())
            .times(1)
            .returning(move |id, _, patch| {
                Ok(link_from(&NewLink {
                    id: id.to_string(),
                    target_url: "https://example.com/".to_string(),
                    redirect_code: RedirectCode::MovedPermanently,
                    edit_token_hash: patch.edit_token_hash.unwrap(),
                    expires_at: None,
                }))
            });

        let svc = LifecycleService::new(
            Arc::new(repo),
            Arc::new(NullCache),
            authority.clone(),
            true,
            Duration::from_secs(5),
        );

        let updated = svc
            .update(
                "abc123",
                "old-token",
                LinkChanges {
                    redirect_code: Some(RedirectCode::PermanentRedirect),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let rotated = updated.rotated_token.expect("rotation enabled");
        assert_eq!(rotated.len(), 24);
        assert!(authority.verify(&rotated, &updated.link.edit_token_hash));
        assert!(!authority.verify("old-token", &updated.link.edit_token_hash));
    }

    #[tokio::test]
    async fn test_alias_change_invalidates_both_ids() {
        let authority = tokens();
        let stored_hash = authority.hash("tok");
        let hash_for_get = stored_hash.clone();
        let hash_for_move = stored_hash.clone();

        let mut repo = MockLinkRepository::new();
        repo.expect_get().times(1).returning(move |id| {
            Ok(Some(link_from(&NewLink {
                id: id.to_string(),
                target_url: "https://example.com/".to_string(),
                redirect_code: RedirectCode::MovedPermanently,
                edit_token_hash: hash_for_get.clone(),
                expires_at: None,
            })))
        });
        repo.expect_change_alias()
            .with(eq("oldname"), eq("newname"))
            .times(1)
            .returning(move |_, new_id| {
                Ok(link_from(&NewLink {
                    id: new_id.to_string(),
                    target_url: "https://example.com/".to_string(),
                    redirect_code: RedirectCode::MovedPermanently,
                    edit_token_hash: hash_for_move.clone(),
                    expires_at: None,
                }))
            });

        let cache = Arc::new(MemoryCache::default());
        for id in ["oldname", "newname"] {
            cache
                .put(id, &Decision::Gone, Duration::from_secs(60))
                .await
                .unwrap();
        }

        let svc = LifecycleService::new(
            Arc::new(repo),
            cache.clone(),
            authority,
            false,
            Duration::from_secs(5),
        );

        let updated = svc
            .update(
                "oldname",
                "tok",
                LinkChanges {
                    new_id: Some("NewName".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.link.id, "newname");
        assert_eq!(cache.lookup("oldname").await.unwrap(), None);
        assert_eq!(cache.lookup("newname").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_retires_and_invalidates() {
        let authority = tokens();
        let stored_hash = authority.hash("tok");
        let hash_for_get = stored_hash.clone();
        let hash_for_retire = stored_hash.clone();

        let mut repo = MockLinkRepository::new();
        repo.expect_get().times(1).returning(move |id| {
            Ok(Some(link_from(&NewLink {
                id: id.to_string(),
                target_url: "https://example.com/".to_string(),
                redirect_code: RedirectCode::MovedPermanently,
                edit_token_hash: hash_for_get.clone(),
                expires_at: None,
            })))
        });
        repo.expect_retire()
            .withf(move |id, hash| id == "abc123" && hash == hash_for_retire)
            .times(1)
            .returning(|_, _| Ok(true));

        let cache = Arc::new(MemoryCache::default());
        cache
            .put(
                "abc123",
                &Decision::Redirect {
                    target_url: "https://example.com/".to_string(),
                    code: RedirectCode::MovedPermanently,
                },
                Duration::from_secs(60),
            )
            .await
            .unwrap();

        let svc = LifecycleService::new(
            Arc::new(repo),
            cache.clone(),
            authority,
            false,
            Duration::from_secs(5),
        );

        svc.delete("abc123", "tok").await.unwrap();
        assert_eq!(cache.lookup("abc123").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_missing_link_not_found() {
        let mut repo = MockLinkRepository::new();
        repo.expect_get().times(1).returning(|_| Ok(None));
        repo.expect_retire().times(0);

        let svc = service(repo, Arc::new(NullCache));
        let err = svc.delete("missing", "tok").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }
}
