//! Event name to subscriber lookup with bounded staleness

use crate::{RelayError, Result, SubscriptionCacheConfig, SubscriptionRegistry, SubscriptionRelayConfig};
use hookrelay_cache::{CacheManager, CacheStore, NamespacedCache};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Cache record for one event name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedSubscription {
    pub subscribers: Vec<SubscriptionRelayConfig>,
}

/// Read-through cache of the subscribers for each event name.
///
/// A cached list is served until its key expires; there is no background
/// refresh and concurrent misses each query the registry. Empty lists are
/// never cached, so a new subscriber to a previously silent event is picked
/// up on the next lookup.
#[derive(Clone)]
pub struct SubscriptionCache {
    cache: NamespacedCache,
    registry: Arc<dyn SubscriptionRegistry>,
    config: SubscriptionCacheConfig,
}

impl SubscriptionCache {
    pub fn new(
        store: Arc<dyn CacheStore>,
        registry: Arc<dyn SubscriptionRegistry>,
        config: SubscriptionCacheConfig,
    ) -> Self {
        let cache = CacheManager::new(store).namespace(&config.namespace);
        Self {
            cache,
            registry,
            config,
        }
    }

    /// Subscribers for `event_name`, from cache or the registry.
    pub async fn get_all(&self, event_name: &str) -> Result<Vec<SubscriptionRelayConfig>> {
        if event_name.is_empty() {
            return Err(RelayError::invalid("event name must not be empty"));
        }

        match self.cache.get::<CachedSubscription>(event_name).await {
            Ok(Some(cached)) => {
                debug!(
                    target: "hookrelay::cache",
                    event = %event_name,
                    subscribers = cached.subscribers.len(),
                    "Subscription cache hit"
                );
                return Ok(cached.subscribers);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(
                    target: "hookrelay::cache",
                    event = %event_name,
                    error = %e,
                    "Subscription cache read failed, falling back to registry"
                );
            }
        }

        let subscribers = self
            .registry
            .search(event_name)
            .await
            .map_err(RelayError::into_registry)?;

        debug!(
            target: "hookrelay::cache",
            event = %event_name,
            subscribers = subscribers.len(),
            "Subscription cache miss"
        );

        if !subscribers.is_empty() {
            let record = CachedSubscription {
                subscribers: subscribers.clone(),
            };
            if let Err(e) = self
                .cache
                .set(event_name, &record, Some(self.config.expiry))
                .await
            {
                warn!(
                    target: "hookrelay::cache",
                    event = %event_name,
                    error = %e,
                    "Failed to store subscribers in cache"
                );
            }
        }

        Ok(subscribers)
    }

    /// Drop the cached entry for `event_name`.
    pub async fn invalidate(&self, event_name: &str) -> Result<()> {
        self.cache.delete(event_name).await?;
        Ok(())
    }

    /// Full cache key used for `event_name`
    pub fn cache_key(&self, event_name: &str) -> String {
        self.cache.build_key(event_name)
    }

    pub fn config(&self) -> &SubscriptionCacheConfig {
        &self.config
    }
}
