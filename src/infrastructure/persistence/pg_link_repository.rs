//! PostgreSQL implementation of the link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{Link, LinkPatch, NewLink, RedirectCode};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

/// Row shape of the `links` table.
#[derive(sqlx::FromRow)]
struct LinkRow {
    id: String,
    target_url: String,
    redirect_code: i16,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    edit_token_hash: String,
    active: bool,
    expires_at: Option<DateTime<Utc>>,
}

impl LinkRow {
    fn into_entity(self) -> Result<Link, AppError> {
        let redirect_code = RedirectCode::from_i16(self.redirect_code).ok_or_else(|| {
            AppError::internal(
                "Stored redirect code is invalid",
                json!({ "id": self.id, "redirect_code": self.redirect_code }),
            )
        })?;

        Ok(Link {
            id: self.id,
            target_url: self.target_url,
            redirect_code,
            created_at: self.created_at,
            updated_at: self.updated_at,
            edit_token_hash: self.edit_token_hash,
            active: self.active,
            expires_at: self.expires_at,
        })
    }
}

const SELECT_COLUMNS: &str =
    "id, target_url, redirect_code, created_at, updated_at, edit_token_hash, active, expires_at";

/// PostgreSQL repository for the authoritative link store.
///
/// The `links` primary key provides the atomic check-and-insert that id
/// allocation relies on; token-hash guards are folded into the mutating
/// statements so verify-then-write cannot race a concurrent rotation.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Distinguishes NotFound from Forbidden after a guarded statement
    /// matched no row.
    async fn classify_guard_miss(&self, id: &str) -> AppError {
        match sqlx::query_scalar::<_, bool>("SELECT active FROM links WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await
        {
            Ok(Some(_)) => AppError::forbidden("Invalid edit token", json!({ "id": id })),
            Ok(None) => AppError::not_found("Link not found", json!({ "id": id })),
            Err(e) => e.into(),
        }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn insert(&self, new_link: NewLink) -> Result<Link, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(&format!(
            r#"
            INSERT INTO links (id, target_url, redirect_code, created_at, updated_at,
                               edit_token_hash, active, expires_at)
            VALUES ($1, $2, $3, NOW(), NOW(), $4, TRUE, $5)
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(&new_link.id)
        .bind(&new_link.target_url)
        .bind(new_link.redirect_code.as_u16() as i16)
        .bind(&new_link.edit_token_hash)
        .bind(new_link.expires_at)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                AppError::conflict("Id already taken", json!({ "id": new_link.id }))
            } else {
                e.into()
            }
        })?;

        row.into_entity()
    }

    async fn get(&self, id: &str) -> Result<Option<Link>, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM links WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(LinkRow::into_entity).transpose()
    }

    async fn update(
        &self,
        id: &str,
        expected_token_hash: &str,
        patch: LinkPatch,
    ) -> Result<Link, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(&format!(
            r#"
            UPDATE links SET
                target_url = COALESCE($3, target_url),
                redirect_code = COALESCE($4, redirect_code),
                expires_at = CASE WHEN $5 THEN $6 ELSE expires_at END,
                edit_token_hash = COALESCE($7, edit_token_hash),
                updated_at = NOW()
            WHERE id = $1 AND edit_token_hash = $2 AND active = TRUE
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(expected_token_hash)
        .bind(&patch.target_url)
        .bind(patch.redirect_code.map(|c| c.as_u16() as i16))
        .bind(patch.expires_at.is_some())
        .bind(patch.expires_at.flatten())
        .bind(&patch.edit_token_hash)
        .fetch_optional(self.pool.as_ref())
        .await?;

        match row {
            Some(row) => row.into_entity(),
            None => Err(self.classify_guard_miss(id).await),
        }
    }

    async fn retire(&self, id: &str, expected_token_hash: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE links SET active = FALSE, updated_at = NOW()
            WHERE id = $1 AND edit_token_hash = $2 AND active = TRUE
            "#,
        )
        .bind(id)
        .bind(expected_token_hash)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        // No row transitioned: already retired, wrong token, or missing.
        let existing = sqlx::query_as::<_, (String, bool)>(
            "SELECT edit_token_hash, active FROM links WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        match existing {
            Some((hash, false)) if hash == expected_token_hash => Ok(false),
            Some(_) => Err(AppError::forbidden(
                "Invalid edit token",
                json!({ "id": id }),
            )),
            None => Err(AppError::not_found("Link not found", json!({ "id": id }))),
        }
    }

    async fn change_alias(&self, old_id: &str, new_id: &str) -> Result<Link, AppError> {
        let mut tx = self.pool.begin().await?;

        let old = sqlx::query_as::<_, LinkRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM links WHERE id = $1 FOR UPDATE"
        ))
        .bind(old_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Link not found", json!({ "id": old_id })))?;

        // Clone under the new id, preserving created_at so link age survives
        // the alias change.
        let new_row = sqlx::query_as::<_, LinkRow>(&format!(
            r#"
            INSERT INTO links (id, target_url, redirect_code, created_at, updated_at,
                               edit_token_hash, active, expires_at)
            VALUES ($1, $2, $3, $4, NOW(), $5, TRUE, $6)
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(new_id)
        .bind(&old.target_url)
        .bind(old.redirect_code)
        .bind(old.created_at)
        .bind(&old.edit_token_hash)
        .bind(old.expires_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                AppError::conflict("Id already taken", json!({ "id": new_id }))
            } else {
                AppError::from(e)
            }
        })?;

        sqlx::query("UPDATE links SET active = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(old_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        new_row.into_entity()
    }

    async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(self.pool.as_ref())
            .await
            .is_ok()
    }
}
