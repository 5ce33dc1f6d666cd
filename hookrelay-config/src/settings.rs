//! Typed settings for the relay pipeline.
//!
//! Resolution order: built-in defaults, then an optional settings file
//! (JSON, TOML or `.env`), then a `.env` file in the working directory,
//! then `HOOKRELAY_*` environment variables.

use crate::{ConfigManager, ConfigValidator, Result, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix for relay settings.
pub const ENV_PREFIX: &str = "HOOKRELAY";

/// Outbound delivery settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliverySettings {
    /// Maximum attempts per subscriber (0 still makes one attempt)
    pub retries: u32,
    /// Per-attempt request timeout in seconds
    pub timeout_secs: u64,
    /// Initial backoff between attempts in milliseconds; 0 retries immediately
    pub backoff_ms: u64,
    /// Largest serialized payload that will be sent
    pub max_payload_bytes: usize,
    /// User-Agent header for outgoing requests
    pub user_agent: String,
}

impl Default for DeliverySettings {
    fn default() -> Self {
        Self {
            retries: 3,
            timeout_secs: 60,
            backoff_ms: 0,
            max_payload_bytes: 1024 * 1024,
            user_agent: format!("hookrelay/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl DeliverySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// Fan-out settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchSettings {
    /// Subscribers delivered to concurrently per event
    pub concurrency: usize,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self { concurrency: 8 }
    }
}

/// Subscription cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Lifetime of a cached subscriber list
    pub expiry_secs: u64,
    /// Redis URL; the in-process cache is used when absent
    pub url: Option<String>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            expiry_secs: 60,
            url: None,
        }
    }
}

impl CacheSettings {
    pub fn expiry(&self) -> Duration {
        Duration::from_secs(self.expiry_secs)
    }
}

/// Event polling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerSettings {
    pub poll_interval_ms: u64,
    /// Events claimed per poll
    pub batch_size: usize,
    /// Events dispatched concurrently
    pub max_in_flight: usize,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            batch_size: 10,
            max_in_flight: 16,
        }
    }
}

impl WorkerSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSettings {
    /// trace, debug, info, warn or error
    pub level: String,
    /// json, pretty, compact or plain
    pub format: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

/// All relay settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelaySettings {
    pub delivery: DeliverySettings,
    pub dispatch: DispatchSettings,
    pub cache: CacheSettings,
    pub worker: WorkerSettings,
    pub log: LogSettings,
}

impl RelaySettings {
    /// Load settings from an optional file plus `.env` and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let manager = ConfigManager::with_prefix(ENV_PREFIX);
        if let Some(path) = path {
            manager.load_file(path)?;
        }
        manager.load_dotenv(None)?;
        Self::from_manager(&manager)
    }

    /// Resolve settings from already-loaded configuration, falling back to defaults.
    pub fn from_manager(manager: &ConfigManager) -> Result<Self> {
        let defaults = Self::default();

        let settings = Self {
            delivery: DeliverySettings {
                retries: manager
                    .get_optional("delivery_retries")?
                    .unwrap_or(defaults.delivery.retries),
                timeout_secs: manager
                    .get_optional("delivery_timeout_secs")?
                    .unwrap_or(defaults.delivery.timeout_secs),
                backoff_ms: manager
                    .get_optional("delivery_backoff_ms")?
                    .unwrap_or(defaults.delivery.backoff_ms),
                max_payload_bytes: manager
                    .get_optional("delivery_max_payload_bytes")?
                    .unwrap_or(defaults.delivery.max_payload_bytes),
                user_agent: manager
                    .get_optional("delivery_user_agent")?
                    .unwrap_or(defaults.delivery.user_agent),
            },
            dispatch: DispatchSettings {
                concurrency: manager
                    .get_optional("dispatch_concurrency")?
                    .unwrap_or(defaults.dispatch.concurrency),
            },
            cache: CacheSettings {
                expiry_secs: manager
                    .get_optional("cache_expiry_secs")?
                    .unwrap_or(defaults.cache.expiry_secs),
                url: manager
                    .get_optional::<String>("cache_url")?
                    .filter(|url| !url.is_empty()),
            },
            worker: WorkerSettings {
                poll_interval_ms: manager
                    .get_optional("worker_poll_interval_ms")?
                    .unwrap_or(defaults.worker.poll_interval_ms),
                batch_size: manager
                    .get_optional("worker_batch_size")?
                    .unwrap_or(defaults.worker.batch_size),
                max_in_flight: manager
                    .get_optional("worker_max_in_flight")?
                    .unwrap_or(defaults.worker.max_in_flight),
            },
            log: LogSettings {
                level: manager
                    .get_optional("log_level")?
                    .unwrap_or(defaults.log.level),
                format: manager
                    .get_optional("log_format")?
                    .unwrap_or(defaults.log.format),
            },
        };

        settings.validate()?;
        Ok(settings)
    }
}

impl Validate for RelaySettings {
    fn validate(&self) -> Result<()> {
        ConfigValidator::in_range(self.delivery.timeout_secs, 1, 3600, "delivery.timeout_secs")?;
        ConfigValidator::in_range(self.delivery.retries, 0, 100, "delivery.retries")?;
        ConfigValidator::not_empty(&self.delivery.user_agent, "delivery.user_agent")?;
        ConfigValidator::in_range(self.dispatch.concurrency, 1, 1024, "dispatch.concurrency")?;
        ConfigValidator::in_range(self.cache.expiry_secs, 1, 86_400, "cache.expiry_secs")?;
        if let Some(url) = &self.cache.url {
            ConfigValidator::is_redis_url(url, "cache.url")?;
        }
        ConfigValidator::in_range(self.worker.batch_size, 1, 10_000, "worker.batch_size")?;
        ConfigValidator::in_range(self.worker.max_in_flight, 1, 10_000, "worker.max_in_flight")?;
        ConfigValidator::one_of(
            &self.log.level,
            &["trace", "debug", "info", "warn", "error"],
            "log.level",
        )?;
        ConfigValidator::one_of(
            &self.log.format,
            &["json", "pretty", "compact", "plain"],
            "log.format",
        )?;
        Ok(())
    }
}
