//! API route configuration.
//!
//! Mutating endpoints are authorized per link via the Bearer edit token;
//! see [`crate::api::middleware::auth`].

use crate::api::handlers::{create_link_handler, delete_link_handler, update_link_handler};
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, post},
};

/// Link management routes, nested under `/api`.
///
/// # Endpoints
///
/// - `POST   /links`       - Create a short link (issues the edit token)
/// - `PATCH  /links/{id}`  - Partially update a link (edit token required)
/// - `DELETE /links/{id}`  - Retire a link (edit token required)
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/links", post(create_link_handler))
        .route(
            "/links/{id}",
            delete(delete_link_handler).patch(update_link_handler),
        )
}
