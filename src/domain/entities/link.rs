//! Link entity representing a shortened URL mapping.

use chrono::{DateTime, Utc};

/// Redirect status code served for a link.
///
/// Restricted to the four redirect codes the engine is allowed to emit.
/// Serialized as the bare status number (`301`, `302`, `307`, `308`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum RedirectCode {
    MovedPermanently,
    Found,
    TemporaryRedirect,
    PermanentRedirect,
}

impl RedirectCode {
    pub fn as_u16(self) -> u16 {
        match self {
            Self::MovedPermanently => 301,
            Self::Found => 302,
            Self::TemporaryRedirect => 307,
            Self::PermanentRedirect => 308,
        }
    }

    /// True for 301/308, which clients may cache aggressively.
    pub fn is_permanent(self) -> bool {
        matches!(self, Self::MovedPermanently | Self::PermanentRedirect)
    }

    pub fn from_i16(code: i16) -> Option<Self> {
        u16::try_from(code).ok().and_then(|c| Self::try_from(c).ok())
    }
}

impl TryFrom<u16> for RedirectCode {
    type Error = String;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            301 => Ok(Self::MovedPermanently),
            302 => Ok(Self::Found),
            307 => Ok(Self::TemporaryRedirect),
            308 => Ok(Self::PermanentRedirect),
            other => Err(format!(
                "redirect_code must be one of 301, 302, 307, 308 (got {})",
                other
            )),
        }
    }
}

impl From<RedirectCode> for u16 {
    fn from(code: RedirectCode) -> u16 {
        code.as_u16()
    }
}

/// A shortened URL link with metadata.
///
/// The `id` is the short identifier itself and is globally unique among all
/// links ever created, retired ones included. `edit_token_hash` holds the
/// peppered HMAC digest of the bearer capability token; the plaintext is
/// never persisted and the hash is never serialized outward.
#[derive(Debug, Clone)]
pub struct Link {
    pub id: String,
    pub target_url: String,
    pub redirect_code: RedirectCode,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub edit_token_hash: String,
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Link {
    /// Returns true if the link has been soft-deleted (retired).
    pub fn is_retired(&self) -> bool {
        !self.active
    }

    /// Returns true if the link has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|e| Utc::now() >= e)
    }

    /// Returns true if the link currently serves redirects.
    pub fn is_resolvable(&self) -> bool {
        self.active && !self.is_expired()
    }
}

/// Input data for inserting a new link record.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub id: String,
    pub target_url: String,
    pub redirect_code: RedirectCode,
    pub edit_token_hash: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Partial update for an existing link.
///
/// `None` fields are left unchanged.
/// `expires_at: Some(None)` clears the expiry; `Some(Some(t))` sets it.
/// `edit_token_hash` is set when token rotation replaces the capability.
#[derive(Debug, Clone, Default)]
pub struct LinkPatch {
    pub target_url: Option<String>,
    pub redirect_code: Option<RedirectCode>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
    pub edit_token_hash: Option<String>,
}

impl LinkPatch {
    /// True when the patch would not change any field.
    pub fn is_empty(&self) -> bool {
        self.target_url.is_none()
            && self.redirect_code.is_none()
            && self.expires_at.is_none()
            && self.edit_token_hash.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_link() -> Link {
        let now = Utc::now();
        Link {
            id: "abc123".to_string(),
            target_url: "https://example.com/".to_string(),
            redirect_code: RedirectCode::MovedPermanently,
            created_at: now,
            updated_at: now,
            edit_token_hash: "deadbeef".to_string(),
            active: true,
            expires_at: None,
        }
    }

    #[test]
    fn test_fresh_link_is_resolvable() {
        let link = sample_link();
        assert!(!link.is_retired());
        assert!(!link.is_expired());
        assert!(link.is_resolvable());
    }

    #[test]
    fn test_retired_link_is_not_resolvable() {
        let mut link = sample_link();
        link.active = false;
        assert!(link.is_retired());
        assert!(!link.is_resolvable());
    }

    #[test]
    fn test_expired_link_is_not_resolvable() {
        let mut link = sample_link();
        link.expires_at = Some(Utc::now() - Duration::seconds(1));
        assert!(link.is_expired());
        assert!(!link.is_resolvable());
    }

    #[test]
    fn test_future_expiry_still_resolvable() {
        let mut link = sample_link();
        link.expires_at = Some(Utc::now() + Duration::hours(1));
        assert!(!link.is_expired());
        assert!(link.is_resolvable());
    }

    #[test]
    fn test_redirect_code_round_trip() {
        for code in [301u16, 302, 307, 308] {
            let rc = RedirectCode::try_from(code).unwrap();
            assert_eq!(rc.as_u16(), code);
        }
        assert!(RedirectCode::try_from(303).is_err());
        assert!(RedirectCode::from_i16(-1).is_none());
    }

    #[test]
    fn test_redirect_code_permanence() {
        assert!(RedirectCode::MovedPermanently.is_permanent());
        assert!(RedirectCode::PermanentRedirect.is_permanent());
        assert!(!RedirectCode::Found.is_permanent());
        assert!(!RedirectCode::TemporaryRedirect.is_permanent());
    }

    #[test]
    fn test_redirect_code_serde_as_number() {
        let json = serde_json::to_string(&RedirectCode::TemporaryRedirect).unwrap();
        assert_eq!(json, "307");
        let back: RedirectCode = serde_json::from_str("308").unwrap();
        assert_eq!(back, RedirectCode::PermanentRedirect);
        assert!(serde_json::from_str::<RedirectCode>("200").is_err());
    }

    #[test]
    fn test_empty_patch() {
        assert!(LinkPatch::default().is_empty());
        let patch = LinkPatch {
            target_url: Some("https://example.org/".to_string()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
