//! Shared helpers for relay integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use hookrelay_cache::InMemoryCache;
use hookrelay_webhooks::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Registry wrapper that counts calls and keeps every result batch.
#[derive(Clone, Default)]
pub struct CountingRegistry {
    pub inner: InMemorySubscriptionRegistry,
    searches: Arc<AtomicUsize>,
    batches: Arc<Mutex<Vec<Vec<SubscriptionDeliveryResult>>>>,
    fail_updates: bool,
}

impl CountingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_updates() -> Self {
        Self {
            fail_updates: true,
            ..Self::default()
        }
    }

    pub fn subscribe(&self, event: &str, owner: &str, url: String) -> String {
        self.inner
            .add(WebhookSubscription::new(event, owner, SubscriptionConfig::new(url)))
            .unwrap()
    }

    pub fn search_calls(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub fn batches(&self) -> Vec<Vec<SubscriptionDeliveryResult>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubscriptionRegistry for CountingRegistry {
    async fn search(&self, event_name: &str) -> Result<Vec<SubscriptionRelayConfig>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.inner.search(event_name).await
    }

    async fn update_results(&self, results: Vec<SubscriptionDeliveryResult>) -> Result<()> {
        self.batches.lock().unwrap().push(results.clone());
        if self.fail_updates {
            return Err(RelayError::Registry("history store unavailable".to_string()));
        }
        self.inner.update_results(results).await
    }
}

pub fn fast_options(retries: u32) -> DeliveryOptions {
    DeliveryOptions::new(retries, Duration::from_millis(200))
}

pub fn client() -> DeliveryClient {
    DeliveryClient::new(DeliveryClientConfig::default()).unwrap()
}

pub fn cache_for(registry: &CountingRegistry) -> SubscriptionCache {
    SubscriptionCache::new(
        Arc::new(InMemoryCache::new()),
        Arc::new(registry.clone()),
        SubscriptionCacheConfig::default(),
    )
}

pub fn dispatcher_for(registry: &CountingRegistry, retries: u32) -> RelayDispatcher {
    RelayDispatcher::new(
        cache_for(registry),
        client(),
        Arc::new(registry.clone()),
        DispatcherConfig::default().with_delivery(fast_options(retries)),
    )
}
