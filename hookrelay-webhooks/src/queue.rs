//! Event publication and polling

use crate::{Result, WebhookEvent};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Where applications publish events to be relayed.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Record a new event and return it.
    async fn write(&self, event_name: &str, data: serde_json::Value) -> Result<WebhookEvent>;
}

/// Where the relay worker pulls pending events from.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Claim up to `max` pending events. A claimed event is never handed out again.
    async fn poll(&self, max: usize) -> Result<Vec<WebhookEvent>>;
}

/// FIFO event queue held in process memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventQueue {
    pending: Arc<Mutex<VecDeque<WebhookEvent>>>,
}

impl InMemoryEventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an already built event
    pub fn push(&self, event: WebhookEvent) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(event);
    }

    /// Number of events waiting to be polled
    pub fn len(&self) -> usize {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EventSink for InMemoryEventQueue {
    async fn write(&self, event_name: &str, data: serde_json::Value) -> Result<WebhookEvent> {
        let event = WebhookEvent::new(event_name, data)?;
        debug!(
            target: "hookrelay::worker",
            event_id = %event.id,
            event = %event.event_name,
            "Event queued"
        );
        self.push(event.clone());
        Ok(event)
    }
}

#[async_trait]
impl EventSource for InMemoryEventQueue {
    async fn poll(&self, max: usize) -> Result<Vec<WebhookEvent>> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let take = max.min(pending.len());
        Ok(pending.drain(..take).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RelayError;

    #[tokio::test]
    async fn test_write_then_poll_in_order() {
        let queue = InMemoryEventQueue::new();
        let first = queue.write("a", serde_json::json!(1)).await.unwrap();
        let second = queue.write("b", serde_json::json!(2)).await.unwrap();
        assert_eq!(queue.len(), 2);

        let polled = queue.poll(10).await.unwrap();
        assert_eq!(polled, vec![first, second]);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_poll_claims_each_event_once() {
        let queue = InMemoryEventQueue::new();
        for i in 0..5 {
            queue.write("a", serde_json::json!(i)).await.unwrap();
        }

        let batch1 = queue.poll(3).await.unwrap();
        let batch2 = queue.poll(3).await.unwrap();
        let batch3 = queue.poll(3).await.unwrap();

        assert_eq!(batch1.len(), 3);
        assert_eq!(batch2.len(), 2);
        assert!(batch3.is_empty());
        assert!(batch1.iter().all(|e| batch2.iter().all(|o| o.id != e.id)));
    }

    #[tokio::test]
    async fn test_write_rejects_empty_name() {
        let queue = InMemoryEventQueue::new();
        let result = queue.write("", serde_json::Value::Null).await;
        assert!(matches!(result, Err(RelayError::InvalidArgument(_))));
        assert!(queue.is_empty());
    }
}
