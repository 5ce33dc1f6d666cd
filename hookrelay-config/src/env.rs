// Environment variable loading

use crate::{ConfigError, Result};
use std::collections::HashMap;
use std::env;

/// Environment variable loader.
///
/// With a prefix of `HOOKRELAY`, `HOOKRELAY_DELIVERY_RETRIES=5` is loaded
/// as `delivery_retries = "5"`. Variables without the prefix are ignored.
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    /// Create a new environment loader
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Load all matching environment variables
    pub fn load(&self) -> Result<HashMap<String, String>> {
        Ok(self.collect(env::vars()))
    }

    fn collect(&self, vars: impl Iterator<Item = (String, String)>) -> HashMap<String, String> {
        vars.filter_map(|(key, value)| match &self.prefix {
            Some(prefix) => key
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_prefix('_'))
                .filter(|rest| !rest.is_empty())
                .map(|rest| (rest.to_lowercase(), value)),
            None => Some((key.to_lowercase(), value)),
        })
        .collect()
    }

    /// Load a specific environment variable
    pub fn load_var(&self, key: &str) -> Result<String> {
        env::var(self.full_key(key)).map_err(ConfigError::EnvError)
    }

    /// Load with default value
    pub fn load_var_or(&self, key: &str, default: &str) -> String {
        self.load_var(key).unwrap_or_else(|_| default.to_string())
    }

    fn full_key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix, key.to_uppercase()),
            None => key.to_uppercase(),
        }
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Iterator<Item = (String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn test_prefix_is_stripped_and_lowercased() {
        let loader = EnvLoader::new(Some("HOOKRELAY".to_string()));
        let loaded = loader.collect(vars(&[
            ("HOOKRELAY_DELIVERY_RETRIES", "5"),
            ("HOOKRELAYX_OTHER", "ignored"),
            ("HOOKRELAY_", "ignored"),
            ("PATH", "/bin"),
        ]));

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get("delivery_retries"), Some(&"5".to_string()));
    }

    #[test]
    fn test_no_prefix_keeps_everything() {
        let loader = EnvLoader::default();
        let loaded = loader.collect(vars(&[("A_B", "1"), ("C", "2")]));
        assert_eq!(loaded.get("a_b"), Some(&"1".to_string()));
        assert_eq!(loaded.get("c"), Some(&"2".to_string()));
    }

    #[test]
    fn test_env_loader_with_default() {
        let loader = EnvLoader::new(Some("HOOKRELAY_TEST".to_string()));
        assert_eq!(loader.load_var_or("NONEXISTENT_VAR_12345", "default"), "default");
        assert!(loader.load_var("MISSING_VAR_67890").is_err());
    }

    #[test]
    fn test_full_key() {
        let loader = EnvLoader::new(Some("HOOKRELAY".to_string()));
        assert_eq!(loader.full_key("cache_url"), "HOOKRELAY_CACHE_URL");
    }
}
