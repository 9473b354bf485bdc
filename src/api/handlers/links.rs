//! Handlers for link management endpoints (create, update, delete).

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::json;
use validator::Validate;

use crate::api::dto::links::{CreateLinkRequest, LinkResponse, UpdateLinkRequest};
use crate::api::middleware::auth::EditToken;
use crate::application::services::LinkChanges;
use crate::domain::entities::RedirectCode;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link.
///
/// # Endpoint
///
/// `POST /api/links`
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com/some/long/path",
///   "custom_id": "my-link",        // optional
///   "redirect_code": 302,          // optional, defaults to 301
///   "expires_at": "2027-01-01T00:00:00Z"  // optional
/// }
/// ```
///
/// # Response
///
/// `201 Created` with the link and its plaintext `edit_token`. The token is
/// shown exactly once; only its hash is stored.
///
/// # Errors
///
/// - `400 Bad Request` - invalid URL, id or redirect code
/// - `409 Conflict` - requested `custom_id` is already taken
/// - `500 Internal Server Error` - id generation kept colliding
pub async fn create_link_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<LinkResponse>), AppError> {
    payload.validate()?;

    let redirect_code = parse_redirect_code(payload.redirect_code)?;

    let (link, edit_token) = state
        .lifecycle_service
        .create(payload.url, payload.custom_id, redirect_code, payload.expires_at)
        .await?;

    let short_url = state.short_url(&link.id);
    let response = LinkResponse::from_link(link, short_url, Some(edit_token));

    Ok((StatusCode::CREATED, Json(response)))
}

/// Partially updates a short link.
///
/// # Endpoint
///
/// `PATCH /api/links/{id}`
///
/// Requires `Authorization: Bearer <edit_token>` issued at creation.
///
/// # Request Body
///
/// All fields are optional. Only provided fields are changed.
///
/// ```json
/// {
///   "url": "https://new-destination.com",
///   "redirect_code": 308,
///   "new_id": "fresh-name",
///   "expires_at": null   // null clears the expiry
/// }
/// ```
///
/// Changing `new_id` retires the old id permanently; it keeps returning
/// 410 Gone and is never reassigned.
///
/// # Errors
///
/// - `400 Bad Request` - invalid input or empty change set
/// - `401 Unauthorized` - missing or malformed Authorization header
/// - `403 Forbidden` - token does not match this link
/// - `404 Not Found` - no link under this id
/// - `409 Conflict` - `new_id` is already taken
/// - `410 Gone` - the link has been retired
pub async fn update_link_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
    EditToken(token): EditToken,
    Json(payload): Json<UpdateLinkRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    payload.validate()?;

    let changes = LinkChanges {
        target_url: payload.url,
        redirect_code: payload.redirect_code.map(|c| parse_redirect_code(Some(c))).transpose()?,
        new_id: payload.new_id,
        expires_at: payload.expires_at,
    };

    let updated = state.lifecycle_service.update(&id, &token, changes).await?;

    let short_url = state.short_url(&updated.link.id);
    Ok(Json(LinkResponse::from_link(
        updated.link,
        short_url,
        updated.rotated_token,
    )))
}

/// Soft-deletes a short link.
///
/// # Endpoint
///
/// `DELETE /api/links/{id}`
///
/// Requires `Authorization: Bearer <edit_token>` issued at creation.
///
/// # Behavior
///
/// The record is **not** removed. The id is retired and subsequent redirect
/// requests return **410 Gone**, forever. Deleting an already-retired link
/// with a valid token succeeds again with `204 No Content`.
///
/// # Errors
///
/// - `401 Unauthorized` - missing or malformed Authorization header
/// - `403 Forbidden` - token does not match this link
/// - `404 Not Found` - no link under this id
pub async fn delete_link_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
    EditToken(token): EditToken,
) -> Result<StatusCode, AppError> {
    state.lifecycle_service.delete(&id, &token).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Maps a wire redirect code to the typed enum, defaulting to 301.
fn parse_redirect_code(code: Option<u16>) -> Result<RedirectCode, AppError> {
    match code {
        None => Ok(RedirectCode::MovedPermanently),
        Some(raw) => RedirectCode::try_from(raw)
            .map_err(|reason| AppError::bad_request("Invalid redirect code", json!({ "reason": reason }))),
    }
}
