//! Edit token extraction from the Authorization header.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_auth::AuthBearer;
use serde_json::json;

use crate::error::AppError;

/// Bearer edit token extracted from `Authorization: Bearer <token>`.
///
/// The token is a per-link capability, so verification against the stored
/// hash happens in the lifecycle service, not here. This extractor only
/// enforces presence and shape of the header: a missing or malformed header
/// is `401 Unauthorized`, while a well-formed but wrong token is rejected
/// later with `403 Forbidden`.
pub struct EditToken(pub String);

impl<S> FromRequestParts<S> for EditToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthBearer(token) = AuthBearer::from_request_parts(parts, state)
            .await
            .map_err(|_| {
                AppError::unauthorized(
                    "Unauthorized",
                    json!({ "reason": "Authorization header is missing or invalid" }),
                )
            })?;

        Ok(EditToken(token))
    }
}
