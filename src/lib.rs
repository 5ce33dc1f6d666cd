//! # hookrelay
//!
//! Relays application events to HTTP subscribers. Events are matched by
//! name against registered subscriptions, posted to each subscriber with
//! bounded retries and an optional `X-Hub-Signature`, and every outcome is
//! recorded as delivery history.
//!
//! The pipeline lives in [`hookrelay_webhooks`]; this crate wires it from
//! [`RelaySettings`] and sets up logging.
//!
//! ```no_run
//! use hookrelay::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> hookrelay::Result<()> {
//!     let registry = InMemorySubscriptionRegistry::new();
//!     registry.add(WebhookSubscription::new(
//!         "order.created",
//!         "user-1",
//!         SubscriptionConfig::new("https://example.com/webhooks"),
//!     ))?;
//!
//!     let relay = HookRelay::builder(RelaySettings::default())
//!         .registry(Arc::new(registry))
//!         .build()
//!         .await?;
//!
//!     let event = WebhookEvent::new("order.created", serde_json::json!({"orderId": 42}))?;
//!     relay.dispatcher().process(&event).await?;
//!     Ok(())
//! }
//! ```

mod error;
pub mod logging;

pub use error::{Error, Result};

pub use hookrelay_cache as cache;
pub use hookrelay_config as config;
pub use hookrelay_webhooks as webhooks;

pub use hookrelay_config::RelaySettings;

use hookrelay_cache::{CacheConfig, CacheStore};
use hookrelay_config::{CacheSettings, DeliverySettings};
use hookrelay_webhooks::{
    DeliveryClient, DeliveryClientConfig, DeliveryOptions, DispatcherConfig, EventSource,
    InMemorySubscriptionRegistry, RelayDispatcher, RelayWorker, RetryPolicy, SubscriptionCache,
    SubscriptionCacheConfig, SubscriptionRegistry, WorkerConfig,
};
use std::sync::Arc;
use tracing::info;

/// Common imports
pub mod prelude {
    pub use crate::{HookRelay, HookRelayBuilder, RelaySettings};
    pub use hookrelay_webhooks::{
        CancellationToken, DeliveryOptions, EventSink, EventSource, InMemoryEventQueue,
        InMemorySubscriptionRegistry, RelayDispatcher, RelayError, RelayWorker,
        SubscriptionConfig, SubscriptionDeliveryResult, SubscriptionRegistry, WebhookEvent,
        WebhookReceiver, WebhookSignature, WebhookSubscription,
    };
}

/// Delivery options described by the delivery settings.
///
/// A zero backoff keeps retries back-to-back.
pub fn delivery_options(settings: &DeliverySettings) -> DeliveryOptions {
    let retry = if settings.backoff_ms == 0 {
        RetryPolicy::immediate(settings.retries)
    } else {
        RetryPolicy::exponential(settings.retries, settings.backoff())
    };
    DeliveryOptions::new(settings.retries, settings.timeout()).with_retry(retry)
}

/// Cache backend described by the cache settings
pub fn cache_config(settings: &CacheSettings) -> CacheConfig {
    match &settings.url {
        Some(url) => CacheConfig::redis(url.clone()),
        None => CacheConfig::memory(),
    }
}

/// A wired relay pipeline.
#[derive(Clone)]
pub struct HookRelay {
    settings: RelaySettings,
    registry: Arc<dyn SubscriptionRegistry>,
    cache: SubscriptionCache,
    dispatcher: RelayDispatcher,
}

impl HookRelay {
    pub fn builder(settings: RelaySettings) -> HookRelayBuilder {
        HookRelayBuilder::new(settings)
    }

    pub fn dispatcher(&self) -> &RelayDispatcher {
        &self.dispatcher
    }

    pub fn cache(&self) -> &SubscriptionCache {
        &self.cache
    }

    pub fn registry(&self) -> &Arc<dyn SubscriptionRegistry> {
        &self.registry
    }

    pub fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    /// Polling worker over `source` using the worker settings
    pub fn worker(&self, source: Arc<dyn EventSource>) -> RelayWorker {
        let worker = &self.settings.worker;
        RelayWorker::new(
            source,
            self.dispatcher.clone(),
            WorkerConfig {
                poll_interval: worker.poll_interval(),
                batch_size: worker.batch_size,
                max_in_flight: worker.max_in_flight,
            },
        )
    }
}

/// Builder for [`HookRelay`]
pub struct HookRelayBuilder {
    settings: RelaySettings,
    registry: Option<Arc<dyn SubscriptionRegistry>>,
    store: Option<Arc<dyn CacheStore>>,
}

impl HookRelayBuilder {
    pub fn new(settings: RelaySettings) -> Self {
        Self {
            settings,
            registry: None,
            store: None,
        }
    }

    /// Subscription registry; an empty in-memory registry when not set
    pub fn registry(mut self, registry: Arc<dyn SubscriptionRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Cache store; connected from the cache settings when not set
    pub fn cache_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub async fn build(self) -> Result<HookRelay> {
        let settings = self.settings;
        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(InMemorySubscriptionRegistry::new()));
        let store = match self.store {
            Some(store) => store,
            None => hookrelay_cache::connect(&cache_config(&settings.cache)).await?,
        };

        let cache = SubscriptionCache::new(
            store,
            registry.clone(),
            SubscriptionCacheConfig::default().with_expiry(settings.cache.expiry()),
        );
        let client = DeliveryClient::new(
            DeliveryClientConfig::builder()
                .user_agent(settings.delivery.user_agent.clone())
                .max_payload_size(settings.delivery.max_payload_bytes)
                .build(),
        )?;
        let dispatcher = RelayDispatcher::new(
            cache.clone(),
            client,
            registry.clone(),
            DispatcherConfig::default()
                .with_delivery(delivery_options(&settings.delivery))
                .with_concurrency(settings.dispatch.concurrency),
        );

        info!(
            target: "hookrelay::dispatch",
            retries = settings.delivery.retries,
            timeout_secs = settings.delivery.timeout_secs,
            concurrency = settings.dispatch.concurrency,
            cache_expiry_secs = settings.cache.expiry_secs,
            "Relay pipeline ready"
        );

        Ok(HookRelay {
            settings,
            registry,
            cache,
            dispatcher,
        })
    }
}
