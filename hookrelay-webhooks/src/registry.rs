//! Subscription registry

use crate::{RelayError, Result, SubscriptionDeliveryResult, SubscriptionRelayConfig, WebhookSubscription};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Persistent store of subscriptions and their delivery history.
///
/// The relay only reads subscriptions through [`search`](Self::search) and
/// writes history through [`update_results`](Self::update_results).
#[async_trait]
pub trait SubscriptionRegistry: Send + Sync {
    /// Active subscriptions whose event matches `event_name` exactly.
    async fn search(&self, event_name: &str) -> Result<Vec<SubscriptionRelayConfig>>;

    /// Append delivery results to the subscriptions' history.
    async fn update_results(&self, results: Vec<SubscriptionDeliveryResult>) -> Result<()>;
}

#[derive(Debug, Default)]
struct RegistryState {
    subscriptions: HashMap<String, WebhookSubscription>,
    history: HashMap<String, Vec<SubscriptionDeliveryResult>>,
}

/// In-process registry for tests and single-node deployments
#[derive(Debug, Clone, Default)]
pub struct InMemorySubscriptionRegistry {
    state: Arc<RwLock<RegistryState>>,
}

impl InMemorySubscriptionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscription, returning its id.
    ///
    /// An owner can hold only one subscription per event.
    pub fn add(&self, subscription: WebhookSubscription) -> Result<String> {
        subscription.validate()?;

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = find_duplicate(&state, &subscription) {
            return Err(RelayError::Conflict(format!(
                "owner `{}` already subscribes to `{}` as {}",
                subscription.created_by_id, subscription.event, existing
            )));
        }
        if state.subscriptions.contains_key(&subscription.id) {
            return Err(RelayError::Conflict(format!(
                "subscription {} already exists",
                subscription.id
            )));
        }

        let id = subscription.id.clone();
        state.subscriptions.insert(id.clone(), subscription);
        Ok(id)
    }

    /// Get a subscription by ID
    pub fn get(&self, id: &str) -> Option<WebhookSubscription> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.subscriptions.get(id).cloned()
    }

    /// Replace a stored subscription, keeping its creation time
    pub fn update(&self, mut subscription: WebhookSubscription) -> Result<()> {
        subscription.validate()?;

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let created_at = match state.subscriptions.get(&subscription.id) {
            Some(current) => current.created_at,
            None => return Err(RelayError::NotFound(subscription.id)),
        };
        if let Some(existing) = find_duplicate(&state, &subscription) {
            return Err(RelayError::Conflict(format!(
                "owner `{}` already subscribes to `{}` as {}",
                subscription.created_by_id, subscription.event, existing
            )));
        }

        subscription.created_at = created_at;
        subscription.last_modified_at = Utc::now();
        state.subscriptions.insert(subscription.id.clone(), subscription);
        Ok(())
    }

    /// Remove a subscription and its history
    pub fn delete(&self, id: &str) -> Result<WebhookSubscription> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.history.remove(id);
        state
            .subscriptions
            .remove(id)
            .ok_or_else(|| RelayError::NotFound(id.to_string()))
    }

    /// All subscriptions created by `created_by_id`, oldest first
    pub fn find_by_owner(&self, created_by_id: &str) -> Vec<WebhookSubscription> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let mut owned: Vec<_> = state
            .subscriptions
            .values()
            .filter(|s| s.created_by_id == created_by_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        owned
    }

    /// Up to `limit` delivery results for a subscription, newest first
    pub fn results_for(&self, subscription_id: &str, limit: usize) -> Vec<SubscriptionDeliveryResult> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .history
            .get(subscription_id)
            .map(|results| results.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    /// Get the number of registered subscriptions
    pub fn count(&self) -> usize {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.subscriptions.len()
    }
}

fn find_duplicate(state: &RegistryState, subscription: &WebhookSubscription) -> Option<String> {
    state
        .subscriptions
        .values()
        .find(|s| {
            s.id != subscription.id
                && s.created_by_id == subscription.created_by_id
                && s.event == subscription.event
        })
        .map(|s| s.id.clone())
}

#[async_trait]
impl SubscriptionRegistry for InMemorySubscriptionRegistry {
    async fn search(&self, event_name: &str) -> Result<Vec<SubscriptionRelayConfig>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let mut matching: Vec<&WebhookSubscription> = state
            .subscriptions
            .values()
            .filter(|s| s.is_active && s.event == event_name)
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        Ok(matching.into_iter().map(WebhookSubscription::to_relay_config).collect())
    }

    async fn update_results(&self, results: Vec<SubscriptionDeliveryResult>) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        for result in results {
            state
                .history
                .entry(result.subscription_id.clone())
                .or_default()
                .push(result);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SubscriptionConfig;

    fn subscription(event: &str, owner: &str) -> WebhookSubscription {
        WebhookSubscription::new(
            event,
            owner,
            SubscriptionConfig::new(format!("https://example.com/{}", owner)),
        )
    }

    #[test]
    fn test_add_and_get() {
        let registry = InMemorySubscriptionRegistry::new();

        let id = registry.add(subscription("user.created", "alice")).unwrap();

        let stored = registry.get(&id).unwrap();
        assert_eq!(stored.event, "user.created");
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_duplicate_owner_event_rejected() {
        let registry = InMemorySubscriptionRegistry::new();
        registry.add(subscription("user.created", "alice")).unwrap();

        let result = registry.add(subscription("user.created", "alice"));
        assert!(matches!(result, Err(RelayError::Conflict(_))));

        // Same event, different owner is fine
        assert!(registry.add(subscription("user.created", "bob")).is_ok());
    }

    #[test]
    fn test_add_rejects_invalid_url() {
        let registry = InMemorySubscriptionRegistry::new();
        let bad = WebhookSubscription::new("a", "alice", SubscriptionConfig::new("not a url"));
        assert!(matches!(registry.add(bad), Err(RelayError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_search_active_only() {
        let registry = InMemorySubscriptionRegistry::new();
        registry.add(subscription("user.created", "alice")).unwrap();
        registry
            .add(subscription("user.created", "bob").deactivated())
            .unwrap();
        registry.add(subscription("order.created", "carol")).unwrap();

        let found = registry.search("user.created").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].config.url, "https://example.com/alice");

        assert!(registry.search("product.created").await.unwrap().is_empty());
    }

    #[test]
    fn test_update_and_delete() {
        let registry = InMemorySubscriptionRegistry::new();
        let id = registry.add(subscription("user.created", "alice")).unwrap();

        let mut changed = registry.get(&id).unwrap();
        changed.config.url = "https://example.com/changed".to_string();
        registry.update(changed).unwrap();
        assert_eq!(registry.get(&id).unwrap().config.url, "https://example.com/changed");

        registry.delete(&id).unwrap();
        assert!(registry.get(&id).is_none());
        assert!(matches!(registry.delete(&id), Err(RelayError::NotFound(_))));
    }

    #[test]
    fn test_update_missing() {
        let registry = InMemorySubscriptionRegistry::new();
        let result = registry.update(subscription("a", "alice"));
        assert!(matches!(result, Err(RelayError::NotFound(_))));
    }

    #[test]
    fn test_update_into_duplicate_rejected() {
        let registry = InMemorySubscriptionRegistry::new();
        registry.add(subscription("a", "alice")).unwrap();
        let id = registry.add(subscription("b", "alice")).unwrap();

        let mut changed = registry.get(&id).unwrap();
        changed.event = "a".to_string();
        assert!(matches!(registry.update(changed), Err(RelayError::Conflict(_))));
    }

    #[test]
    fn test_find_by_owner() {
        let registry = InMemorySubscriptionRegistry::new();
        registry.add(subscription("a", "alice")).unwrap();
        registry.add(subscription("b", "alice")).unwrap();
        registry.add(subscription("a", "bob")).unwrap();

        assert_eq!(registry.find_by_owner("alice").len(), 2);
        assert_eq!(registry.find_by_owner("bob").len(), 1);
        assert!(registry.find_by_owner("carol").is_empty());
    }

    #[tokio::test]
    async fn test_results_newest_first() {
        let registry = InMemorySubscriptionRegistry::new();
        let id = registry.add(subscription("a", "alice")).unwrap();

        let first = SubscriptionDeliveryResult::new(id.clone(), 500, "Internal Server Error", 3);
        let second = SubscriptionDeliveryResult::new(id.clone(), 200, "OK", 1);
        registry.update_results(vec![first]).await.unwrap();
        registry.update_results(vec![second]).await.unwrap();

        let history = registry.results_for(&id, 10);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].status_code, 200);
        assert_eq!(history[1].status_code, 500);

        assert_eq!(registry.results_for(&id, 1).len(), 1);
        assert!(registry.results_for("unknown", 10).is_empty());
    }
}
