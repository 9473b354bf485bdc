//! Handler for short URL redirect.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::Response,
};
use serde_json::json;

use crate::domain::decision::Decision;
use crate::domain::entities::RedirectCode;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::id_generator::normalize_id;

/// Redirects a short id to its destination URL.
///
/// # Endpoint
///
/// `GET /{id}` (HEAD is served from the same route)
///
/// # Request Flow
///
/// 1. Normalize the id (lowercase)
/// 2. Resolve through the decision cache, falling back to the store
/// 3. Serve the decision
///
/// # Cache-Control
///
/// - **301/308**: `public, max-age=<configured>, immutable` - permanent
///   redirects are safe for clients and CDNs to cache
/// - **302/307**: `no-store` - the destination may change, clients must
///   re-resolve every time
///
/// # Errors
///
/// - `404 Not Found` - no link has ever used this id
/// - `410 Gone` - the link existed but was retired or expired
/// - `503 Service Unavailable` - the authoritative store is unreachable
pub async fn redirect_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let id = normalize_id(&id);

    match state.resolver_service.resolve(&id).await? {
        Decision::Redirect { target_url, code } => {
            let cache_control = if code.is_permanent() {
                format!("public, max-age={}, immutable", state.permanent_cache_max_age)
            } else {
                "no-store".to_string()
            };

            Response::builder()
                .status(redirect_status(code))
                .header(header::LOCATION, &target_url)
                .header(header::CACHE_CONTROL, cache_control)
                .body(Body::empty())
                .map_err(|e| {
                    AppError::internal(
                        "Failed to build redirect response",
                        json!({ "reason": e.to_string() }),
                    )
                })
        }
        Decision::Gone => Err(AppError::gone(
            "Link has been retired",
            json!({ "id": id }),
        )),
        Decision::Absent => Err(AppError::not_found("Link not found", json!({ "id": id }))),
    }
}

fn redirect_status(code: RedirectCode) -> StatusCode {
    match code {
        RedirectCode::MovedPermanently => StatusCode::MOVED_PERMANENTLY,
        RedirectCode::Found => StatusCode::FOUND,
        RedirectCode::TemporaryRedirect => StatusCode::TEMPORARY_REDIRECT,
        RedirectCode::PermanentRedirect => StatusCode::PERMANENT_REDIRECT,
    }
}
