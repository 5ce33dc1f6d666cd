//! Cache configuration types.

use std::fmt;
use std::time::Duration;

/// Cache backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheBackend {
    /// Process-local store
    #[default]
    Memory,
    /// Redis backend
    Redis,
}

impl fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheBackend::Memory => write!(f, "Memory"),
            CacheBackend::Redis => write!(f, "Redis"),
        }
    }
}

/// Cache configuration.
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    /// Cache backend type
    pub backend: CacheBackend,

    /// Connection URL (Redis only)
    pub url: Option<String>,

    /// Key prefix for all cache keys
    pub key_prefix: Option<String>,

    /// TTL applied when a caller stores a value without one
    pub default_ttl: Option<Duration>,
}

impl CacheConfig {
    /// In-process cache configuration.
    pub fn memory() -> Self {
        Self::default()
    }

    /// Redis cache configuration.
    ///
    /// ```
    /// use hookrelay_cache::{CacheBackend, CacheConfig};
    ///
    /// let config = CacheConfig::redis("redis://localhost:6379");
    /// assert_eq!(config.backend, CacheBackend::Redis);
    /// ```
    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            backend: CacheBackend::Redis,
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Set the key prefix.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Set the default TTL.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Build the final key with prefix if configured.
    pub fn build_key(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_is_default() {
        let config = CacheConfig::default();
        assert_eq!(config.backend, CacheBackend::Memory);
        assert!(config.url.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = CacheConfig::redis("redis://localhost:6379")
            .with_key_prefix("relay")
            .with_default_ttl(Duration::from_secs(300));

        assert_eq!(config.url.as_deref(), Some("redis://localhost:6379"));
        assert_eq!(config.key_prefix, Some("relay".to_string()));
        assert_eq!(config.default_ttl, Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_build_key() {
        let config = CacheConfig::memory().with_key_prefix("relay");
        assert_eq!(config.build_key("subscribers:a"), "relay:subscribers:a");
        assert_eq!(CacheConfig::memory().build_key("k"), "k");
    }
}
