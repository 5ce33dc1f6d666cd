//! Fan-out of one event to all of its subscribers

use crate::{
    DeliveryClient, DispatcherConfig, RelayError, Result, SubscriptionCache, SubscriptionRegistry,
    WebhookEvent,
};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Relays events to every matching subscriber and records the outcomes.
#[derive(Clone)]
pub struct RelayDispatcher {
    cache: SubscriptionCache,
    client: DeliveryClient,
    registry: Arc<dyn SubscriptionRegistry>,
    config: DispatcherConfig,
}

impl RelayDispatcher {
    pub fn new(
        cache: SubscriptionCache,
        client: DeliveryClient,
        registry: Arc<dyn SubscriptionRegistry>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            cache,
            client,
            registry,
            config,
        }
    }

    /// Deliver `event` to all of its subscribers.
    ///
    /// Subscriber failures are recorded as results, not returned. The
    /// results are handed to the registry in a single batch once every
    /// delivery has finished.
    pub async fn process(&self, event: &WebhookEvent) -> Result<()> {
        self.process_with_cancel(event, &CancellationToken::new())
            .await
    }

    /// Like [`process`](Self::process), stopping early when `cancel` fires.
    ///
    /// Results of deliveries that completed before cancellation are still
    /// recorded, then [`RelayError::Cancelled`] is returned.
    pub async fn process_with_cancel(
        &self,
        event: &WebhookEvent,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if event.event_name.is_empty() {
            return Err(RelayError::invalid("event name must not be empty"));
        }
        if cancel.is_cancelled() {
            return Err(RelayError::Cancelled);
        }

        let subscribers = self.cache.get_all(&event.event_name).await?;
        if subscribers.is_empty() {
            debug!(
                target: "hookrelay::dispatch",
                event_id = %event.id,
                event = %event.event_name,
                "No subscribers for event"
            );
            return Ok(());
        }

        let total = subscribers.len();
        let options = &self.config.delivery;
        let mut deliveries = stream::iter(subscribers)
            .map(|subscription| async move {
                let outcome = self
                    .client
                    .deliver_with_cancel(&subscription, &event.event_name, &event.data, options, cancel)
                    .await;
                (subscription, outcome)
            })
            .buffer_unordered(self.config.concurrency.max(1));

        let mut results = Vec::with_capacity(total);
        let mut cancelled = false;
        while let Some((subscription, outcome)) = deliveries.next().await {
            match outcome {
                Ok(result) => results.push(result.with_event_id(&event.id)),
                Err(RelayError::Cancelled) => cancelled = true,
                Err(e) => {
                    warn!(
                        target: "hookrelay::dispatch",
                        event_id = %event.id,
                        event = %event.event_name,
                        subscription_id = %subscription.subscription_id,
                        error = %e,
                        "Skipping subscriber"
                    );
                }
            }
        }

        let delivered = results.iter().filter(|r| r.is_success()).count();
        let recorded = results.len();
        if !results.is_empty() {
            self.registry
                .update_results(results)
                .await
                .map_err(RelayError::into_registry)?;
        }

        if cancelled {
            info!(
                target: "hookrelay::dispatch",
                event_id = %event.id,
                event = %event.event_name,
                subscribers = total,
                recorded,
                "Event dispatch cancelled"
            );
            return Err(RelayError::Cancelled);
        }

        info!(
            target: "hookrelay::dispatch",
            event_id = %event.id,
            event = %event.event_name,
            subscribers = total,
            delivered,
            failed = recorded - delivered,
            "Event dispatched"
        );
        Ok(())
    }

    pub fn cache(&self) -> &SubscriptionCache {
        &self.cache
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }
}
