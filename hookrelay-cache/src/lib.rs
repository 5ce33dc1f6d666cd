//! TTL cache stores for hookrelay.
//!
//! The relay pipeline keeps "which subscribers want event X" behind a
//! time-bounded cache. This crate provides the backend side of that cache:
//! a [`CacheStore`] trait with atomic get/set-with-expiry semantics, an
//! [`InMemoryCache`] for single-process deployments and tests, and a
//! Redis-backed store for shared deployments.
//!
//! # Features
//!
//! - `redis` - Enable the [`RedisCache`] backend
//!
//! # Examples
//!
//! ```no_run
//! use hookrelay_cache::*;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> CacheResult<()> {
//! let store: Arc<dyn CacheStore> = Arc::new(InMemoryCache::new());
//! let cache = CacheManager::new(store).namespace("subscribers");
//!
//! cache
//!     .set("order.created", &vec!["https://example.com/hook"], Some(Duration::from_secs(60)))
//!     .await?;
//!
//! let urls: Option<Vec<String>> = cache.get("order.created").await?;
//! assert_eq!(urls.map(|u| u.len()), Some(1));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod manager;
pub mod memory;
pub mod traits;

#[cfg(feature = "redis")]
pub mod redis_cache;

pub use config::{CacheBackend, CacheConfig};
pub use error::{CacheError, CacheResult};
pub use manager::{CacheManager, NamespacedCache};
pub use memory::InMemoryCache;
pub use traits::CacheStore;

#[cfg(feature = "redis")]
pub use redis_cache::RedisCache;

/// Build a shared cache store for the configured backend.
///
/// Without the `redis` feature, requesting the Redis backend is a
/// configuration error.
pub async fn connect(config: &CacheConfig) -> CacheResult<std::sync::Arc<dyn CacheStore>> {
    match config.backend {
        CacheBackend::Memory => Ok(std::sync::Arc::new(InMemoryCache::new())),
        #[cfg(feature = "redis")]
        CacheBackend::Redis => Ok(std::sync::Arc::new(RedisCache::new(config.clone()).await?)),
        #[cfg(not(feature = "redis"))]
        CacheBackend::Redis => Err(CacheError::Config(
            "Redis backend requested but the `redis` feature is disabled".to_string(),
        )),
    }
}
