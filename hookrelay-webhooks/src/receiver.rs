//! Webhook receiver for verifying incoming signed callbacks

use crate::signature::headers;
use crate::{RelayError, Result, WebhookSignature};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// Verifies `X-Hub-Signature` on requests signed with a shared secret
#[derive(Debug, Clone)]
pub struct WebhookReceiver {
    secret: String,
}

impl WebhookReceiver {
    /// Create a new receiver with the given secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Verify an incoming webhook signature
    pub fn verify(&self, body: &[u8], signature: &str) -> Result<bool> {
        WebhookSignature::verify(body, signature, &self.secret)
    }

    /// Verify the signature carried in the request headers.
    ///
    /// Header names are matched case-insensitively.
    pub fn verify_from_headers(&self, body: &[u8], headers: &HashMap<String, String>) -> Result<bool> {
        let signature = headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(headers::SIGNATURE))
            .map(|(_, value)| value.as_str())
            .filter(|value| !value.is_empty())
            .ok_or(RelayError::SignatureMissing)?;

        self.verify(body, signature)
    }

    /// Verify the request and deserialize its body
    pub fn receive<T: DeserializeOwned>(&self, body: &[u8], headers: &HashMap<String, String>) -> Result<T> {
        if !self.verify_from_headers(body, headers)? {
            return Err(RelayError::SignatureInvalid(
                "Signature verification failed".to_string(),
            ));
        }

        Ok(serde_json::from_slice(body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_headers(name: &str, body: &[u8], secret: &str) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert(name.to_string(), WebhookSignature::sign(body, secret).unwrap());
        headers
    }

    #[test]
    fn test_verify_valid_signature() {
        let receiver = WebhookReceiver::new("test-secret");
        let signature = WebhookSignature::sign(b"test payload", "test-secret").unwrap();

        assert!(receiver.verify(b"test payload", &signature).unwrap());
    }

    #[test]
    fn test_verify_invalid_signature() {
        let receiver = WebhookReceiver::new("correct-secret");
        let signature = WebhookSignature::sign(b"test payload", "wrong-secret").unwrap();

        assert!(!receiver.verify(b"test payload", &signature).unwrap());
    }

    #[test]
    fn test_verify_from_headers_any_case() {
        let receiver = WebhookReceiver::new("test-secret");

        for name in ["X-Hub-Signature", "x-hub-signature", "X-HUB-SIGNATURE"] {
            let headers = signed_headers(name, b"payload", "test-secret");
            assert!(receiver.verify_from_headers(b"payload", &headers).unwrap());
        }
    }

    #[test]
    fn test_verify_missing_signature() {
        let receiver = WebhookReceiver::new("test-secret");

        let result = receiver.verify_from_headers(b"payload", &HashMap::new());
        assert!(matches!(result, Err(RelayError::SignatureMissing)));

        let headers = signed_headers("X-Webhook-Signature", b"payload", "test-secret");
        let result = receiver.verify_from_headers(b"payload", &headers);
        assert!(matches!(result, Err(RelayError::SignatureMissing)));
    }

    #[test]
    fn test_receive_and_parse() {
        let receiver = WebhookReceiver::new("test-secret");
        let body = br#"{"orderId":42}"#;
        let headers = signed_headers("X-Hub-Signature", body, "test-secret");

        let parsed: serde_json::Value = receiver.receive(body, &headers).unwrap();
        assert_eq!(parsed["orderId"], 42);
    }

    #[test]
    fn test_receive_rejects_tampered_body() {
        let receiver = WebhookReceiver::new("test-secret");
        let headers = signed_headers("X-Hub-Signature", br#"{"orderId":42}"#, "test-secret");

        let result: Result<serde_json::Value> = receiver.receive(br#"{"orderId":43}"#, &headers);
        assert!(matches!(result, Err(RelayError::SignatureInvalid(_))));
    }
}
