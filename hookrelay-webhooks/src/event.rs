//! Webhook event type

use crate::{RelayError, Result};
use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An application event waiting to be relayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    /// Unique identifier for this event
    pub id: String,

    /// Event name (e.g., "user.created") used to match subscriptions
    pub event_name: String,

    /// The event data, posted as the delivery body
    pub data: serde_json::Value,

    /// Creation time, rounded to the millisecond
    pub created_at: DateTime<Utc>,
}

impl WebhookEvent {
    /// Create a new event with the given name and data.
    pub fn new(event_name: impl Into<String>, data: serde_json::Value) -> Result<Self> {
        let event_name = event_name.into();
        if event_name.trim().is_empty() {
            return Err(RelayError::invalid("event name must not be empty"));
        }

        Ok(Self {
            id: Uuid::new_v4().simple().to_string(),
            event_name,
            data,
            created_at: now_millis(),
        })
    }

    /// Set a custom ID
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Serialized data, as sent on the wire
    pub fn data_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.data)?)
    }
}

/// Current UTC time rounded to whole milliseconds.
pub(crate) fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    now.duration_round(TimeDelta::milliseconds(1)).unwrap_or(now)
}
