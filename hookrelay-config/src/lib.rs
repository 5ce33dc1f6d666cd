// Configuration management for the hookrelay pipeline

pub mod env;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use env::EnvLoader;
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use settings::{
    CacheSettings, DeliverySettings, DispatchSettings, LogSettings, RelaySettings, WorkerSettings,
};
pub use validation::{ConfigValidator, Validate};

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

/// Layered key/value configuration store.
///
/// Later loads override earlier ones, so the usual order is file, then
/// `.env`, then the process environment.
#[derive(Clone, Default)]
pub struct ConfigManager {
    config: Arc<RwLock<HashMap<String, Value>>>,
    env_prefix: Option<String>,
}

impl ConfigManager {
    /// Create a new configuration manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with environment variable prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            env_prefix: Some(prefix.into()),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables
    pub fn load_env(&self) -> Result<()> {
        let loader = EnvLoader::new(self.env_prefix.clone());
        let env_vars = loader.load()?;

        let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in env_vars {
            config.insert(key, Value::String(value));
        }

        Ok(())
    }

    /// Load a `.env` file into the process environment, then load the environment.
    ///
    /// A missing default `.env` is not an error; a missing explicit path is.
    pub fn load_dotenv(&self, path: Option<&Path>) -> Result<()> {
        if let Some(path) = path {
            dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
        } else {
            dotenvy::dotenv().ok();
        }
        self.load_env()
    }

    /// Load configuration from a file, detecting the format from its extension
    pub fn load_file(&self, path: &Path) -> Result<()> {
        let data = ConfigLoader::auto(path)?.load_file(path)?;

        let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
        config.extend(data);

        Ok(())
    }

    /// Set a configuration value
    pub fn set<T: serde::Serialize>(&self, key: &str, value: T) -> Result<()> {
        let json_value = serde_json::to_value(value).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
        config.insert(key.to_string(), json_value);

        Ok(())
    }

    /// Get a configuration value.
    ///
    /// String values (as loaded from the environment) are also parsed as
    /// JSON literals, so `"5"` reads as a number and `"true"` as a bool.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.get_optional(key)?
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))
    }

    /// Get a configuration value, `None` when the key is absent.
    ///
    /// Unlike [`ConfigManager::get_or`], a present but malformed value is an error.
    pub fn get_optional<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let config = self.config.read().unwrap_or_else(PoisonError::into_inner);

        let Some(value) = config.get(key) else {
            return Ok(None);
        };

        match serde_json::from_value(value.clone()) {
            Ok(parsed) => Ok(Some(parsed)),
            Err(err) => match value {
                Value::String(raw) => serde_json::from_str(raw).map(Some).map_err(|_| {
                    ConfigError::InvalidValue {
                        key: key.to_string(),
                        message: err.to_string(),
                    }
                }),
                _ => Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: err.to_string(),
                }),
            },
        }
    }

    /// Get a configuration value with default
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Check if a key exists
    pub fn has(&self, key: &str) -> bool {
        let config = self.config.read().unwrap_or_else(PoisonError::into_inner);
        config.contains_key(key)
    }

    /// Get all configuration keys
    pub fn keys(&self) -> Vec<String> {
        let config = self.config.read().unwrap_or_else(PoisonError::into_inner);
        config.keys().cloned().collect()
    }
}
