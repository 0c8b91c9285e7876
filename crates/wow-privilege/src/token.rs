//! HMAC-bound privilege tokens.
//!
//! Wire format (version 1, future versions additive):
//!
//! ```text
//! 1:<created_unix>:<expires_unix>:<sha512-hmac-hex>
//! ```
//!
//! The MAC covers `version:created:expires` and is keyed by the stored
//! passphrase hash, or by the per-session ephemeral secret when no
//! passphrase is configured. Verification is constant-time.

use hmac::{Hmac, Mac};
use sha2::Sha512;
use subtle::ConstantTimeEq;

use crate::error::{PrivilegeError, PrivilegeResult};

type HmacSha512 = Hmac<Sha512>;

/// Current token format version.
pub const TOKEN_VERSION: u32 = 1;

/// A parsed privilege token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivilegeToken {
    /// Format version.
    pub version: u32,
    /// Unix second the token was minted.
    pub created_unix: i64,
    /// Unix second the token expires.
    pub expires_unix: i64,
    /// Hex-encoded SHA-512 HMAC over `version:created:expires`.
    pub hmac_hex: String,
}

impl PrivilegeToken {
    /// Mint a token valid from `now` for `duration_secs`, keyed by
    /// `secret`.
    #[must_use]
    pub fn mint(secret: &[u8], now: i64, duration_secs: i64) -> Self {
        let created_unix = now;
        let expires_unix = now.saturating_add(duration_secs);
        let hmac_hex = compute_mac(secret, TOKEN_VERSION, created_unix, expires_unix);
        Self { version: TOKEN_VERSION, created_unix, expires_unix, hmac_hex }
    }

    /// Encode to the on-disk line format.
    #[must_use]
    pub fn encode(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.version, self.created_unix, self.expires_unix, self.hmac_hex
        )
    }

    /// Parse the on-disk format.
    ///
    /// # Errors
    ///
    /// Returns [`PrivilegeError::MalformedToken`] for anything but four
    /// colon-separated fields with numeric prefix fields.
    pub fn parse(text: &str) -> PrivilegeResult<Self> {
        let parts: Vec<&str> = text.trim().split(':').collect();
        let [version, created, expires, mac] = parts.as_slice() else {
            return Err(PrivilegeError::MalformedToken(format!(
                "expected 4 fields, got {}",
                parts.len()
            )));
        };
        let version: u32 = version
            .parse()
            .map_err(|_| PrivilegeError::MalformedToken("non-numeric version".into()))?;
        let created_unix: i64 = created
            .parse()
            .map_err(|_| PrivilegeError::MalformedToken("non-numeric created".into()))?;
        let expires_unix: i64 = expires
            .parse()
            .map_err(|_| PrivilegeError::MalformedToken("non-numeric expires".into()))?;
        Ok(Self { version, created_unix, expires_unix, hmac_hex: (*mac).to_string() })
    }

    /// Verify the MAC against `secret`, in constant time.
    #[must_use]
    pub fn verify(&self, secret: &[u8]) -> bool {
        let expected = compute_mac(secret, self.version, self.created_unix, self.expires_unix);
        expected.as_bytes().ct_eq(self.hmac_hex.as_bytes()).into()
    }

    /// Whether the token is past its expiry at `now`.
    #[must_use]
    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expires_unix
    }
}

fn compute_mac(secret: &[u8], version: u32, created: i64, expires: i64) -> String {
    // HMAC accepts keys of any length; new_from_slice cannot fail here.
    let mut mac = HmacSha512::new_from_slice(secret).expect("hmac accepts any key length");
    mac.update(format!("{version}:{created}:{expires}").as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-material";

    #[test]
    fn test_mint_and_verify() {
        let token = PrivilegeToken::mint(SECRET, 1_000, 600);
        assert_eq!(token.version, TOKEN_VERSION);
        assert_eq!(token.created_unix, 1_000);
        assert_eq!(token.expires_unix, 1_600);
        assert!(token.verify(SECRET));
    }

    #[test]
    fn test_encode_parse_roundtrip() {
        let token = PrivilegeToken::mint(SECRET, 1_000, 600);
        let parsed = PrivilegeToken::parse(&token.encode()).unwrap();
        assert_eq!(parsed, token);
        assert!(parsed.verify(SECRET));
    }

    #[test]
    fn test_encode_format() {
        let token = PrivilegeToken::mint(SECRET, 1_000, 600);
        let encoded = token.encode();
        assert!(encoded.starts_with("1:1000:1600:"));
        // SHA-512 hex digest is 128 chars.
        assert_eq!(encoded.split(':').nth(3).unwrap().len(), 128);
    }

    #[test]
    fn test_wrong_secret_fails_verification() {
        let token = PrivilegeToken::mint(SECRET, 1_000, 600);
        assert!(!token.verify(b"other-secret"));
    }

    #[test]
    fn test_tampered_expiry_fails_verification() {
        let mut token = PrivilegeToken::mint(SECRET, 1_000, 600);
        token.expires_unix += 86_400;
        assert!(!token.verify(SECRET));
    }

    #[test]
    fn test_expiry() {
        let token = PrivilegeToken::mint(SECRET, 1_000, 600);
        assert!(!token.is_expired(1_599));
        assert!(!token.is_expired(1_600));
        assert!(token.is_expired(1_601));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for text in ["", "1:2:3", "x:1:2:abc", "1:x:2:abc", "1:2:x:abc", "1:2:3:a:b"] {
            assert!(PrivilegeToken::parse(text).is_err(), "expected error: {text}");
        }
    }
}
