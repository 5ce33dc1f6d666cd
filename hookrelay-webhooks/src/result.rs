//! Delivery result records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of one delivery attempt sequence to one subscriber.
///
/// Only the terminal attempt is described; intermediate failures are folded
/// into `attempts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDeliveryResult {
    pub id: String,
    pub subscription_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Time of the final attempt
    pub attempted_at: DateTime<Utc>,
    /// HTTP status of the final attempt, or a synthetic status when there was no response
    pub status_code: u16,
    pub status_description: String,
    /// Attempts made, 0 when nothing was sent
    pub attempts: u32,
}

impl SubscriptionDeliveryResult {
    pub(crate) fn new(
        subscription_id: impl Into<String>,
        status_code: u16,
        status_description: impl Into<String>,
        attempts: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            subscription_id: subscription_id.into(),
            event_id: None,
            attempted_at: crate::event::now_millis(),
            status_code,
            status_description: status_description.into(),
            attempts,
        }
    }

    /// Attach the event this result belongs to.
    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }

    /// Whether the subscriber accepted the delivery (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_success() {
        assert!(SubscriptionDeliveryResult::new("s", 200, "OK", 1).is_success());
        assert!(SubscriptionDeliveryResult::new("s", 204, "No Content", 1).is_success());
        assert!(!SubscriptionDeliveryResult::new("s", 400, "Bad Request", 1).is_success());
        assert!(!SubscriptionDeliveryResult::new("s", 503, "Service Unavailable", 3).is_success());
    }

    #[test]
    fn test_with_event_id() {
        let result = SubscriptionDeliveryResult::new("s", 200, "OK", 1).with_event_id("evt-1");
        assert_eq!(result.event_id.as_deref(), Some("evt-1"));
        assert_eq!(result.subscription_id, "s");
        assert_ne!(result.id, result.subscription_id);
    }
}
