//! Event relay pipeline for hookrelay
//!
//! Application events are matched against registered subscriptions and
//! relayed by HTTP POST to each subscriber, with bounded retries, one
//! recorded result per subscriber, and optional HMAC payload signing.
//!
//! # Features
//!
//! - **Subscription Cache**: event name to subscribers, read-through with expiry
//! - **Delivery Client**: signed POSTs with retry on transient failures
//! - **Dispatcher**: bounded fan-out of one event, results recorded in one batch
//! - **Signatures**: `X-Hub-Signature` signing and constant-time verification
//! - **Worker**: polls an event source and dispatches with cancellation
//!
//! # Example: Relaying an Event
//!
//! ```rust,no_run
//! use hookrelay_cache::InMemoryCache;
//! use hookrelay_webhooks::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let registry = InMemorySubscriptionRegistry::new();
//!     registry.add(WebhookSubscription::new(
//!         "order.created",
//!         "user-1",
//!         SubscriptionConfig::new("https://example.com/webhooks").with_secret("s3cret"),
//!     ))?;
//!
//!     let registry: Arc<dyn SubscriptionRegistry> = Arc::new(registry);
//!     let cache = SubscriptionCache::new(
//!         Arc::new(InMemoryCache::new()),
//!         registry.clone(),
//!         SubscriptionCacheConfig::default(),
//!     );
//!     let client = DeliveryClient::new(DeliveryClientConfig::default())?;
//!     let dispatcher = RelayDispatcher::new(cache, client, registry, DispatcherConfig::default());
//!
//!     let event = WebhookEvent::new("order.created", serde_json::json!({"orderId": 42}))?;
//!     dispatcher.process(&event).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Example: Verifying a Callback
//!
//! ```rust
//! use hookrelay_webhooks::{WebhookReceiver, WebhookSignature};
//!
//! let body = br#"{"orderId":42}"#;
//! let signature = WebhookSignature::sign(body, "s3cret").unwrap();
//!
//! let receiver = WebhookReceiver::new("s3cret");
//! assert!(receiver.verify(body, &signature).unwrap());
//! ```

mod cache;
mod client;
mod config;
mod dispatcher;
mod error;
mod event;
mod queue;
mod receiver;
mod registry;
mod result;
mod retry;
mod signature;
mod subscription;
mod worker;

pub use cache::{CachedSubscription, SubscriptionCache};
pub use client::DeliveryClient;
pub use config::{
    DEFAULT_MAX_PAYLOAD_SIZE, DEFAULT_RETRIES, DEFAULT_TIMEOUT, DeliveryClientConfig,
    DeliveryClientConfigBuilder, DeliveryOptions, DispatcherConfig, SubscriptionCacheConfig,
};
pub use dispatcher::RelayDispatcher;
pub use error::RelayError;
pub use event::WebhookEvent;
pub use queue::{EventSink, EventSource, InMemoryEventQueue};
pub use receiver::WebhookReceiver;
pub use registry::{InMemorySubscriptionRegistry, SubscriptionRegistry};
pub use result::SubscriptionDeliveryResult;
pub use retry::RetryPolicy;
pub use signature::{SIGNATURE_PREFIX, WebhookSignature, headers};
pub use subscription::{
    DEFAULT_CONTENT_TYPE, SubscriptionConfig, SubscriptionRelayConfig, WebhookSubscription,
};
pub use worker::{RelayWorker, WorkerConfig};

/// Cancellation handle accepted by the `*_with_cancel` operations and the worker
pub use tokio_util::sync::CancellationToken;

/// Result type for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;
