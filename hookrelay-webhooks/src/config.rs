//! Configuration for the delivery client, dispatcher and subscription cache

use crate::RetryPolicy;
use std::time::Duration;

/// Default per-attempt request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default number of delivery attempts
pub const DEFAULT_RETRIES: u32 = 3;

/// Default largest payload that will be posted
pub const DEFAULT_MAX_PAYLOAD_SIZE: usize = 1024 * 1024;

/// Per-call delivery options.
///
/// Passed to every [`crate::DeliveryClient::deliver`] call so concurrent
/// callers never share retry or timeout state.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryOptions {
    /// Attempt budget and backoff
    pub retry: RetryPolicy,

    /// Timeout applied to each attempt
    pub timeout: Duration,
}

impl Default for DeliveryOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::immediate(DEFAULT_RETRIES),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl DeliveryOptions {
    /// `retries` back-to-back attempts with the given timeout
    pub fn new(retries: u32, timeout: Duration) -> Self {
        Self {
            retry: RetryPolicy::immediate(retries),
            timeout,
        }
    }

    /// Replace the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the per-attempt timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Configuration for the HTTP side of the delivery client
#[derive(Debug, Clone)]
pub struct DeliveryClientConfig {
    /// User-Agent header for outgoing requests
    pub user_agent: String,

    /// Maximum payload size in bytes
    pub max_payload_size: usize,

    /// Time allowed to establish a connection
    pub connect_timeout: Duration,
}

impl Default for DeliveryClientConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("hookrelay/{}", env!("CARGO_PKG_VERSION")),
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl DeliveryClientConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for custom configuration
    pub fn builder() -> DeliveryClientConfigBuilder {
        DeliveryClientConfigBuilder::new()
    }
}

/// Builder for DeliveryClientConfig
#[derive(Debug, Clone, Default)]
pub struct DeliveryClientConfigBuilder {
    config: DeliveryClientConfig,
}

impl DeliveryClientConfigBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            config: DeliveryClientConfig::default(),
        }
    }

    /// Set the User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set maximum payload size
    pub fn max_payload_size(mut self, size: usize) -> Self {
        self.config.max_payload_size = size;
        self
    }

    /// Set the connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Build the configuration
    pub fn build(self) -> DeliveryClientConfig {
        self.config
    }
}

/// Configuration for the relay dispatcher
#[derive(Debug, Clone, PartialEq)]
pub struct DispatcherConfig {
    /// Options used for every subscriber delivery
    pub delivery: DeliveryOptions,

    /// Deliveries in flight at once for one event; 1 is sequential
    pub concurrency: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            delivery: DeliveryOptions::default(),
            concurrency: 8,
        }
    }
}

impl DispatcherConfig {
    pub fn with_delivery(mut self, delivery: DeliveryOptions) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }
}

/// Configuration for the subscription cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionCacheConfig {
    /// How long a non-empty subscriber list stays cached
    pub expiry: Duration,

    /// Key namespace, entries are stored under `<namespace>:<event>`
    pub namespace: String,
}

impl Default for SubscriptionCacheConfig {
    fn default() -> Self {
        Self {
            expiry: Duration::from_secs(60),
            namespace: "subscribers".to_string(),
        }
    }
}

impl SubscriptionCacheConfig {
    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = expiry;
        self
    }
}
