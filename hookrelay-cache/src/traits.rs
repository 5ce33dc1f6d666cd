//! Backend contract for cache stores

use crate::error::CacheResult;
use async_trait::async_trait;
use std::time::Duration;

/// Expiring string store shared by every relay component.
///
/// Values are opaque JSON text; typed access goes through
/// [`crate::NamespacedCache`]. A write with a TTL is atomic: readers observe
/// the old entry or the new entry together with its expiry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Live value under `key`, `None` once it expired or was never written.
    async fn get_json(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store `value`, replacing any previous entry. `None` keeps it until deleted.
    async fn set_json(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()>;

    async fn delete(&self, key: &str) -> CacheResult<()>;

    async fn exists(&self, key: &str) -> CacheResult<bool>;

    /// Drop every entry held by this store.
    async fn clear(&self) -> CacheResult<()>;

    /// Time left before `key` expires; `None` for missing or non-expiring keys.
    async fn ttl(&self, key: &str) -> CacheResult<Option<Duration>>;
}
