// Configuration file loaders

use crate::{ConfigError, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileFormat {
    Json,
    Toml,
    Env,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(FileFormat::Json),
            "toml" => Some(FileFormat::Toml),
            "env" => Some(FileFormat::Env),
            _ => None,
        }
    }
}

/// Configuration file loader.
///
/// Every format is normalized to a flat JSON object: nested tables are
/// joined with `_` (`[delivery] retries = 3` becomes `delivery_retries`)
/// and keys are lowercased, matching what [`crate::EnvLoader`] produces.
pub struct ConfigLoader {
    format: FileFormat,
}

impl ConfigLoader {
    pub fn new(format: FileFormat) -> Self {
        Self { format }
    }

    /// Auto-detect format from file extension
    pub fn auto(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ConfigError::LoadError("No file extension found".to_string()))?;

        let format = FileFormat::from_extension(ext)
            .ok_or_else(|| ConfigError::LoadError(format!("Unsupported format: {}", ext)))?;

        Ok(Self::new(format))
    }

    /// Load configuration from file
    pub fn load_file(&self, path: &Path) -> Result<Map<String, Value>> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::LoadError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        self.parse(&content)
    }

    /// Parse configuration from string
    pub fn parse(&self, content: &str) -> Result<Map<String, Value>> {
        let value = match self.format {
            FileFormat::Json => serde_json::from_str(content)
                .map_err(|e| ConfigError::ParseError(format!("JSON parse error: {}", e)))?,
            FileFormat::Toml => {
                let toml_value: toml::Value = toml::from_str(content)
                    .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;
                serde_json::to_value(toml_value).map_err(|e| {
                    ConfigError::ParseError(format!("TOML to JSON conversion error: {}", e))
                })?
            }
            FileFormat::Env => parse_env(content),
        };

        match value {
            Value::Object(map) => {
                let mut flat = Map::new();
                flatten_into(&mut flat, None, map);
                Ok(flat)
            }
            _ => Err(ConfigError::ParseError(
                "Configuration root must be a table/object".to_string(),
            )),
        }
    }
}

fn parse_env(content: &str) -> Value {
    let mut map = Map::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            map.insert(key.trim().to_string(), Value::String(value.to_string()));
        }
    }

    Value::Object(map)
}

fn flatten_into(out: &mut Map<String, Value>, prefix: Option<&str>, map: Map<String, Value>) {
    for (key, value) in map {
        let key = match prefix {
            Some(prefix) => format!("{}_{}", prefix, key.to_lowercase()),
            None => key.to_lowercase(),
        };
        match value {
            Value::Object(nested) => flatten_into(out, Some(&key), nested),
            other => {
                out.insert(key, other);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json() {
        let loader = ConfigLoader::new(FileFormat::Json);
        let result = loader
            .parse(r#"{"delivery": {"retries": 5}, "log_level": "debug"}"#)
            .unwrap();

        assert_eq!(result.get("delivery_retries"), Some(&Value::from(5)));
        assert_eq!(result.get("log_level"), Some(&Value::from("debug")));
    }

    #[test]
    fn test_parse_toml_flattens_tables() {
        let loader = ConfigLoader::new(FileFormat::Toml);
        let toml = r#"
            [delivery]
            retries = 4
            timeout_secs = 10

            [cache]
            url = "redis://localhost:6379"
        "#;

        let result = loader.parse(toml).unwrap();
        assert_eq!(result.get("delivery_retries"), Some(&Value::from(4)));
        assert_eq!(result.get("delivery_timeout_secs"), Some(&Value::from(10)));
        assert_eq!(
            result.get("cache_url"),
            Some(&Value::from("redis://localhost:6379"))
        );
    }

    #[test]
    fn test_parse_env() {
        let loader = ConfigLoader::new(FileFormat::Env);
        let env = r#"
            DELIVERY_RETRIES=2
            # Comment
            LOG_FORMAT="pretty"
        "#;

        let result = loader.parse(env).unwrap();
        assert_eq!(result.get("delivery_retries"), Some(&Value::from("2")));
        assert_eq!(result.get("log_format"), Some(&Value::from("pretty")));
    }

    #[test]
    fn test_non_object_root_rejected() {
        let loader = ConfigLoader::new(FileFormat::Json);
        assert!(loader.parse("[1, 2, 3]").is_err());
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(FileFormat::from_extension("json"), Some(FileFormat::Json));
        assert_eq!(FileFormat::from_extension("TOML"), Some(FileFormat::Toml));
        assert_eq!(FileFormat::from_extension("env"), Some(FileFormat::Env));
        assert_eq!(FileFormat::from_extension("yaml"), None);
        assert!(ConfigLoader::auto(Path::new("relay")).is_err());
    }
}
