//! Repository trait for the authoritative link store.

use crate::domain::entities::{Link, LinkPatch, NewLink};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for the durable, authoritative link store.
///
/// The store is keyed by the short id and enforces global uniqueness across
/// every link ever created, retired ones included. Id reservation *is* the
/// insert: there is no separate check-and-reserve step, so concurrent
/// creators cannot race past each other.
///
/// Mutations on the same id are serialized by the implementation (row-level
/// atomicity); mutations on different ids proceed in parallel.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL
/// - [`crate::infrastructure::persistence::MemoryLinkRepository`] - in-process,
///   for tests and single-instance development
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Atomically inserts a new link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the id is already present, whether
    /// the existing record is active or retired.
    /// Returns [`AppError::Unavailable`] / [`AppError::Internal`] on store errors.
    async fn insert(&self, new_link: NewLink) -> Result<Link, AppError>;

    /// Fetches a link by id, retired records included.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on store errors.
    async fn get(&self, id: &str) -> Result<Option<Link>, AppError>;

    /// Partially updates an active link, guarded by the stored token hash.
    ///
    /// The hash comparison happens in the same atomic statement as the write,
    /// so a concurrent rotation cannot slip between verify and apply.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no active record has this id.
    /// Returns [`AppError::Forbidden`] if the record exists but the stored
    /// hash does not match `expected_token_hash`.
    async fn update(
        &self,
        id: &str,
        expected_token_hash: &str,
        patch: LinkPatch,
    ) -> Result<Link, AppError>;

    /// Soft-deletes a link, guarded by the stored token hash.
    ///
    /// Returns `Ok(true)` if the record transitioned to retired, `Ok(false)`
    /// if it was already retired. The record itself is never removed.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] / [`AppError::Forbidden`] as in
    /// [`Self::update`].
    async fn retire(&self, id: &str, expected_token_hash: &str) -> Result<bool, AppError>;

    /// Moves a link to a new id in a single transaction.
    ///
    /// Inserts a clone of the old record under `new_id` (preserving
    /// `created_at`, target, code, expiry and token hash) and retires the old
    /// record. To an external observer there is no window where both or
    /// neither id serve redirects. The old id stays in the key space forever.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if `old_id` does not exist.
    /// Returns [`AppError::Conflict`] if `new_id` is already taken.
    async fn change_alias(&self, old_id: &str, new_id: &str) -> Result<Link, AppError>;

    /// Checks whether the backing store is reachable.
    async fn health_check(&self) -> bool;
}
