//! Short id generation and validation utilities.
//!
//! Generated ids are 6 lowercase hexadecimal characters drawn from the OS
//! random source. Reservation against concurrent creators is *not* handled
//! here: callers attempt the store insert and retry on conflict, so the
//! store's uniqueness constraint is the only arbiter.

use crate::error::AppError;
use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;

/// Random bytes per generated id; hex-encodes to 6 characters.
const ID_LENGTH_BYTES: usize = 3;

/// Pattern for custom ids after lowercase normalization.
static ID_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z0-9_-]{1,32}$").unwrap());

/// Ids reserved for system endpoints to prevent routing conflicts.
const RESERVED_IDS: &[&str] = &[
    "api",
    "admin",
    "health",
    "metrics",
    "robots",
    "favicon",
    "static",
    "dashboard",
];

/// Generates a random 6-character lowercase hexadecimal id.
///
/// # Panics
///
/// Panics if the system random number generator fails (extremely rare).
pub fn generate_id() -> String {
    let mut buffer = [0u8; ID_LENGTH_BYTES];

    getrandom::fill(&mut buffer).expect("Failed to generate random bytes");

    hex::encode(buffer)
}

/// Lowercases a caller-provided id. Validation is separate.
pub fn normalize_id(raw: &str) -> String {
    raw.to_ascii_lowercase()
}

/// Validates a normalized custom id.
///
/// # Rules
///
/// - Length: 1-32 characters
/// - Allowed characters: lowercase letters, digits, underscore, hyphen
/// - Cannot be a reserved system id
///
/// # Errors
///
/// Returns [`AppError::Validation`] if any rule is violated.
pub fn validate_custom_id(id: &str) -> Result<(), AppError> {
    if !ID_REGEX.is_match(id) {
        return Err(AppError::bad_request(
            "Id must be 1-32 characters of [a-z0-9_-]",
            json!({ "id": id }),
        ));
    }

    if RESERVED_IDS.contains(&id) {
        return Err(AppError::bad_request(
            "This id is reserved",
            json!({ "id": id }),
        ));
    }

    Ok(())
}
