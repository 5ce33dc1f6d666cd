//! Subscription types

use crate::{RelayError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// Content type used when a subscription does not override it.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Where and how to deliver events for one subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionConfig {
    /// Absolute http(s) URL receiving the POST
    pub url: String,

    /// Content-Type override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Shared secret for `X-Hub-Signature`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    /// Accept invalid TLS certificates from this subscriber
    #[serde(default)]
    pub is_insecure_ssl_allowed: bool,
}

impl SubscriptionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content_type: None,
            secret: None,
            is_insecure_ssl_allowed: false,
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn allow_insecure_ssl(mut self, allowed: bool) -> Self {
        self.is_insecure_ssl_allowed = allowed;
        self
    }

    /// Content type to send, falling back to JSON.
    pub fn effective_content_type(&self) -> &str {
        self.content_type
            .as_deref()
            .filter(|ct| !ct.trim().is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
    }

    /// Secret to sign with, if one is configured and non-empty.
    pub fn signing_secret(&self) -> Option<&str> {
        self.secret.as_deref().filter(|s| !s.is_empty())
    }

    /// Parse and check the target URL.
    pub fn parsed_url(&self) -> Result<Url> {
        let url = Url::parse(&self.url)
            .map_err(|e| RelayError::invalid(format!("invalid subscription url `{}`: {}", self.url, e)))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(RelayError::invalid(format!(
                "subscription url `{}` must use http or https, not {}",
                self.url, scheme
            ))),
        }
    }
}

/// The snapshot needed to attempt one delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRelayConfig {
    pub subscription_id: String,
    pub config: SubscriptionConfig,
}

impl SubscriptionRelayConfig {
    pub fn new(subscription_id: impl Into<String>, config: SubscriptionConfig) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            config,
        }
    }

    /// Reject snapshots that cannot be delivered.
    pub fn validate(&self) -> Result<()> {
        if self.subscription_id.trim().is_empty() {
            return Err(RelayError::invalid("subscription id must not be empty"));
        }
        if self.config.url.trim().is_empty() {
            return Err(RelayError::invalid("subscription url must not be empty"));
        }
        Ok(())
    }
}

/// A registered subscription as stored by a registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookSubscription {
    pub id: String,
    pub name: String,
    /// Event name this subscription matches, exactly
    pub event: String,
    pub is_active: bool,
    pub created_by_id: String,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
    pub config: SubscriptionConfig,
}

impl WebhookSubscription {
    /// Create an active subscription owned by `created_by_id`.
    pub fn new(
        event: impl Into<String>,
        created_by_id: impl Into<String>,
        config: SubscriptionConfig,
    ) -> Self {
        let now = Utc::now();
        let event = event.into();
        Self {
            id: Uuid::new_v4().simple().to_string(),
            name: event.clone(),
            event,
            is_active: true,
            created_by_id: created_by_id.into(),
            created_at: now,
            last_modified_at: now,
            config,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Relay snapshot of this subscription.
    pub fn to_relay_config(&self) -> SubscriptionRelayConfig {
        SubscriptionRelayConfig::new(self.id.clone(), self.config.clone())
    }

    /// Check fields a registry must not accept.
    pub fn validate(&self) -> Result<()> {
        if self.event.trim().is_empty() {
            return Err(RelayError::invalid("subscription event must not be empty"));
        }
        if self.created_by_id.trim().is_empty() {
            return Err(RelayError::invalid("subscription owner must not be empty"));
        }
        self.config.parsed_url().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_content_type() {
        let config = SubscriptionConfig::new("https://example.com");
        assert_eq!(config.effective_content_type(), "application/json");

        let config = config.with_content_type("application/vnd.api+json");
        assert_eq!(config.effective_content_type(), "application/vnd.api+json");

        let config = SubscriptionConfig::new("https://example.com").with_content_type("  ");
        assert_eq!(config.effective_content_type(), "application/json");
    }

    #[test]
    fn test_signing_secret_ignores_empty() {
        assert_eq!(SubscriptionConfig::new("https://a").signing_secret(), None);
        assert_eq!(
            SubscriptionConfig::new("https://a").with_secret("").signing_secret(),
            None
        );
        assert_eq!(
            SubscriptionConfig::new("https://a").with_secret("s").signing_secret(),
            Some("s")
        );
    }

    #[test]
    fn test_parsed_url() {
        assert!(SubscriptionConfig::new("https://example.com/hook").parsed_url().is_ok());
        assert!(SubscriptionConfig::new("/relative").parsed_url().is_err());
        assert!(SubscriptionConfig::new("ftp://example.com").parsed_url().is_err());
    }

    #[test]
    fn test_relay_config_validate() {
        let ok = SubscriptionRelayConfig::new("sub-1", SubscriptionConfig::new("https://a"));
        assert!(ok.validate().is_ok());

        let no_id = SubscriptionRelayConfig::new("", SubscriptionConfig::new("https://a"));
        assert!(no_id.validate().is_err());

        let no_url = SubscriptionRelayConfig::new("sub-1", SubscriptionConfig::new(""));
        assert!(no_url.validate().is_err());
    }

    #[test]
    fn test_subscription_to_relay_config() {
        let subscription = WebhookSubscription::new(
            "order.created",
            "user-1",
            SubscriptionConfig::new("https://example.com").with_secret("s"),
        );

        let relay = subscription.to_relay_config();
        assert_eq!(relay.subscription_id, subscription.id);
        assert_eq!(relay.config.secret.as_deref(), Some("s"));
        assert!(subscription.is_active);
        assert_eq!(subscription.name, "order.created");
    }

    #[test]
    fn test_wire_field_names() {
        let relay = SubscriptionRelayConfig::new(
            "sub-1",
            SubscriptionConfig::new("https://a").allow_insecure_ssl(true),
        );
        let json = serde_json::to_value(&relay).unwrap();

        assert_eq!(json["subscriptionId"], "sub-1");
        assert_eq!(json["config"]["isInsecureSslAllowed"], true);
        assert!(json["config"].get("secret").is_none());
    }
}
