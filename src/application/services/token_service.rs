//! Edit token authority: issuing, hashing and verifying capability tokens.

use hmac::{Hmac, Mac};
use rand::distr::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Length of issued plaintext tokens (alphanumeric, ~143 bits of entropy).
const TOKEN_LENGTH: usize = 24;

/// A freshly issued capability token.
///
/// `plaintext` is handed to the caller exactly once and never persisted;
/// only `hash` is stored alongside the link.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub plaintext: String,
    pub hash: String,
}

/// Authority for link edit tokens.
///
/// Tokens are bearer capabilities: possession authorizes mutation of one
/// link. There are no accounts and no sessions. Hashes are HMAC-SHA256 keyed
/// by a server-side pepper, so an attacker with read-only access to the
/// database cannot verify or forge tokens without the secret.
pub struct TokenService {
    pepper: String,
}

impl TokenService {
    /// Creates a new token authority.
    ///
    /// `pepper` must match the value in use when existing hashes were
    /// computed; rotating it invalidates every issued token.
    pub fn new(pepper: String) -> Self {
        Self { pepper }
    }

    /// Issues a new token from a cryptographically strong source.
    ///
    /// The plaintext is 24 characters of `[A-Za-z0-9]`.
    pub fn issue(&self) -> IssuedToken {
        let rng = StdRng::from_os_rng();
        let plaintext: String = rng
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect();
        let hash = self.hash(&plaintext);

        IssuedToken { plaintext, hash }
    }

    /// Hashes a plaintext token with HMAC-SHA256 under the server pepper.
    ///
    /// Returns a 64-character lowercase hex-encoded MAC.
    pub fn hash(&self, plaintext: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.pepper.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(plaintext.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Verifies a plaintext token against a stored hash in constant time.
    ///
    /// Recomputes the MAC and compares via [`Mac::verify_slice`], which is
    /// timing-safe. An undecodable stored hash never verifies.
    pub fn verify(&self, plaintext: &str, stored_hash: &str) -> bool {
        let Ok(expected) = hex::decode(stored_hash) else {
            return false;
        };

        let mut mac = HmacSha256::new_from_slice(self.pepper.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(plaintext.as_bytes());
        mac.verify_slice(&expected).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-pepper".to_string())
    }

    #[test]
    fn test_issued_token_shape() {
        let token = service().issue();
        assert_eq!(token.plaintext.len(), 24);
        assert!(token.plaintext.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(token.hash.len(), 64);
    }

    #[test]
    fn test_issued_tokens_are_unique() {
        let svc = service();
        let a = svc.issue();
        let b = svc.issue();
        assert_ne!(a.plaintext, b.plaintext);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn test_verify_round_trip() {
        let svc = service();
        let token = svc.issue();
        assert!(svc.verify(&token.plaintext, &token.hash));
    }

    #[test]
    fn test_verify_rejects_wrong_token() {
        let svc = service();
        let token = svc.issue();
        assert!(!svc.verify("wrong-token-wrong-token-", &token.hash));
    }

    #[test]
    fn test_verify_rejects_undecodable_hash() {
        let svc = service();
        assert!(!svc.verify("anything", "not-hex"));
        assert!(!svc.verify("anything", ""));
    }

    #[test]
    fn test_pepper_matters() {
        let a = TokenService::new("pepper-a".to_string());
        let b = TokenService::new("pepper-b".to_string());

        let token = a.issue();
        assert_ne!(a.hash(&token.plaintext), b.hash(&token.plaintext));
        assert!(!b.verify(&token.plaintext, &token.hash));
    }

    #[test]
    fn test_hash_is_deterministic() {
        let svc = service();
        assert_eq!(svc.hash("token"), svc.hash("token"));
        assert_ne!(svc.hash("token1"), svc.hash("token2"));
    }
}
