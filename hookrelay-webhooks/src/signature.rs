//! Webhook signature generation and verification

use crate::{RelayError, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Literal tag placed in front of the hex digest.
///
/// Subscribers built against the `X-Hub-Signature` convention parse this
/// tag, so it stays `sha1=` even though the digest is HMAC-SHA256.
pub const SIGNATURE_PREFIX: &str = "sha1=";

/// HMAC signing of raw request bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebhookSignature;

impl WebhookSignature {
    /// Sign `body` with `secret`, returning `sha1=<hex HMAC-SHA256>`.
    ///
    /// An empty body is a valid body; an empty secret is rejected.
    pub fn sign(body: &[u8], secret: &str) -> Result<String> {
        if secret.is_empty() {
            return Err(RelayError::invalid("signing secret must not be empty"));
        }

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| RelayError::invalid(e.to_string()))?;
        mac.update(body);

        Ok(format!(
            "{}{}",
            SIGNATURE_PREFIX,
            hex::encode(mac.finalize().into_bytes())
        ))
    }

    /// Check `signature` against the signature of `body` under `secret`.
    ///
    /// Returns `Ok(false)` on any mismatch; errors only when the signature
    /// or secret is empty.
    pub fn verify(body: &[u8], signature: &str, secret: &str) -> Result<bool> {
        if signature.is_empty() {
            return Err(RelayError::invalid("signature must not be empty"));
        }

        let expected = Self::sign(body, secret)?;
        Ok(constant_time_compare(signature, &expected))
    }
}

/// Constant-time string comparison to prevent timing attacks
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Header names used on outbound deliveries
pub mod headers {
    /// Event name
    pub const EVENT: &str = "X-Webhook-Event";

    /// Per-attempt request id
    pub const DELIVERY: &str = "X-Webhook-Delivery";

    /// Payload signature, only sent when the subscription has a secret
    pub const SIGNATURE: &str = "X-Hub-Signature";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_format() {
        let signature = WebhookSignature::sign(b"Hello, World!", "test-secret").unwrap();

        assert!(signature.starts_with("sha1="));
        // 32-byte digest, hex encoded
        assert_eq!(signature.len(), SIGNATURE_PREFIX.len() + 64);
        assert!(signature[5..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_sign_known_vector() {
        // RFC 4231 test case 2
        let signature = WebhookSignature::sign(b"what do ya want for nothing?", "Jefe").unwrap();
        assert_eq!(
            signature,
            "sha1=5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_sign_is_deterministic() {
        let sig1 = WebhookSignature::sign(b"payload", "secret").unwrap();
        let sig2 = WebhookSignature::sign(b"payload", "secret").unwrap();
        assert_eq!(sig1, sig2);
    }

    #[test]
    fn test_different_secrets_differ() {
        let sig1 = WebhookSignature::sign(b"payload", "secret1").unwrap();
        let sig2 = WebhookSignature::sign(b"payload", "secret2").unwrap();
        assert_ne!(sig1, sig2);
    }

    #[test]
    fn test_sign_empty_body() {
        assert!(WebhookSignature::sign(b"", "secret").is_ok());
    }

    #[test]
    fn test_sign_empty_secret() {
        let result = WebhookSignature::sign(b"payload", "");
        assert!(matches!(result, Err(RelayError::InvalidArgument(_))));
    }

    #[test]
    fn test_verify_roundtrip() {
        let body = br#"{"id":"123"}"#;
        let signature = WebhookSignature::sign(body, "secret").unwrap();
        assert!(WebhookSignature::verify(body, &signature, "secret").unwrap());
    }

    #[test]
    fn test_verify_wrong_secret() {
        let body = b"payload";
        let signature = WebhookSignature::sign(body, "secret1").unwrap();
        assert!(!WebhookSignature::verify(body, &signature, "secret2").unwrap());
    }

    #[test]
    fn test_verify_tampered_body() {
        let signature = WebhookSignature::sign(b"payload", "secret").unwrap();
        assert!(!WebhookSignature::verify(b"payload!", &signature, "secret").unwrap());
    }

    #[test]
    fn test_verify_is_case_sensitive() {
        let signature = WebhookSignature::sign(b"payload", "secret").unwrap();
        let upper = signature.to_uppercase();
        assert!(!WebhookSignature::verify(b"payload", &upper, "secret").unwrap());
    }

    #[test]
    fn test_verify_empty_inputs() {
        assert!(WebhookSignature::verify(b"payload", "", "secret").is_err());
        assert!(WebhookSignature::verify(b"payload", "sha1=abc", "").is_err());
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "ab"));
        assert!(!constant_time_compare("", "a"));
    }
}
