//! DTOs for link management endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use validator::Validate;

use crate::domain::entities::Link;

/// Request body for `POST /api/links`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLinkRequest {
    /// Destination URL (must be valid HTTP/HTTPS).
    #[validate(url(message = "Invalid URL format"))]
    pub url: String,

    /// Optional caller-chosen id. Case-insensitive; stored lowercase.
    #[validate(length(min = 1, max = 32))]
    pub custom_id: Option<String>,

    /// Redirect status code: 301, 302, 307 or 308. Defaults to 301.
    pub redirect_code: Option<u16>,

    /// Optional expiry timestamp. After this time, the link returns 410 Gone.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Request body for `PATCH /api/links/{id}`.
///
/// All fields are optional. Only provided fields are changed.
///
/// # `expires_at` semantics
///
/// - **Absent** (`expires_at` not in JSON) - leave existing value unchanged
/// - **`null`** - clear expiry (link never expires)
/// - **Timestamp** - set new expiry
#[serde_as]
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLinkRequest {
    /// New destination URL for this link.
    #[validate(url(message = "Invalid URL format"))]
    pub url: Option<String>,

    /// New redirect status code: 301, 302, 307 or 308.
    pub redirect_code: Option<u16>,

    /// New short id. The old id is retired, not recycled.
    #[validate(length(min = 1, max = 32))]
    pub new_id: Option<String>,

    /// Expiry timestamp. Absent = no change, null = clear, value = set.
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

/// JSON representation of a link.
///
/// `edit_token` is present only in responses that mint a token (creation,
/// or an update with rotation enabled). The token hash itself is never
/// serialized.
#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub id: String,
    pub short_url: String,
    pub target_url: String,
    pub redirect_code: u16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_token: Option<String>,
}

impl LinkResponse {
    pub fn from_link(link: Link, short_url: String, edit_token: Option<String>) -> Self {
        Self {
            id: link.id,
            short_url,
            target_url: link.target_url,
            redirect_code: link.redirect_code.as_u16(),
            created_at: link.created_at,
            updated_at: link.updated_at,
            expires_at: link.expires_at,
            edit_token,
        }
    }
}
