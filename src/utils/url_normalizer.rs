//! Target URL normalization and sanitization.
//!
//! Ensures a consistent, safe representation before storage: scheme
//! allowlisting, length bounds, and ASCII-compatible (punycode) hosts for
//! internationalized domains.

use url::Url;

/// Maximum accepted URL length, before and after normalization.
pub const MAX_URL_LENGTH: usize = 2048;

/// Errors that can occur during URL normalization.
#[derive(Debug, thiserror::Error)]
pub enum UrlNormalizationError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL exceeds {MAX_URL_LENGTH} characters")]
    TooLong,
}

/// Normalizes a target URL to its canonical stored form.
///
/// # Normalization Rules
///
/// 1. **Protocol**: only `http` and `https`; `javascript:`, `data:`, `file:`
///    and every other scheme are rejected
/// 2. **Host**: lowercased; internationalized domains are converted to their
///    ASCII-compatible (punycode) encoding
/// 3. **Default ports**: removed (80 for HTTP, 443 for HTTPS)
/// 4. **Length**: at most 2048 characters before and after normalization
///
/// Paths, query strings and fragments are preserved as provided.
///
/// # Errors
///
/// Returns [`UrlNormalizationError::InvalidFormat`] for malformed URLs,
/// [`UrlNormalizationError::UnsupportedProtocol`] for disallowed schemes,
/// and [`UrlNormalizationError::TooLong`] for oversized inputs.
pub fn normalize_url(input: &str) -> Result<String, UrlNormalizationError> {
    if input.len() > MAX_URL_LENGTH {
        return Err(UrlNormalizationError::TooLong);
    }

    let url = Url::parse(input).map_err(|e| UrlNormalizationError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlNormalizationError::UnsupportedProtocol),
    }

    if url.host_str().is_none() {
        return Err(UrlNormalizationError::InvalidFormat(
            "URL has no host".to_string(),
        ));
    }

    // The url crate lowercases the host, applies IDNA/punycode encoding and
    // drops default ports during parsing; serializing yields the canon form.
    let normalized = url.to_string();
    if normalized.len() > MAX_URL_LENGTH {
        return Err(UrlNormalizationError::TooLong);
    }

    Ok(normalized)
}
