//! Resolution decision returned by the read path and stored in the cache.

use crate::domain::entities::{Link, RedirectCode};
use serde::{Deserialize, Serialize};

/// Outcome of resolving a short id.
///
/// This is both the resolver's return value and the unit stored in the
/// resolution cache. `Absent` is the negatively-cached "never existed"
/// case and maps to 404 at the boundary; a cache miss is *not* `Absent`
/// and must fall through to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Redirect {
        target_url: String,
        code: RedirectCode,
    },
    Gone,
    Absent,
}

impl Decision {
    /// Classifies a stored link into its resolution decision.
    pub fn for_link(link: &Link) -> Self {
        if link.is_resolvable() {
            Decision::Redirect {
                target_url: link.target_url.clone(),
                code: link.redirect_code,
            }
        } else {
            Decision::Gone
        }
    }
}
