//! Settings loaded from files on disk.

use hookrelay_config::{ConfigManager, RelaySettings};
use std::io::Write;

fn write_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_toml_file_sections() {
    let file = write_file(
        ".toml",
        r#"
        [delivery]
        retries = 5
        timeout_secs = 15
        backoff_ms = 250

        [dispatch]
        concurrency = 2

        [cache]
        expiry_secs = 30

        [worker]
        poll_interval_ms = 100
        "#,
    );

    let manager = ConfigManager::new();
    manager.load_file(file.path()).unwrap();
    let settings = RelaySettings::from_manager(&manager).unwrap();

    assert_eq!(settings.delivery.retries, 5);
    assert_eq!(settings.delivery.timeout_secs, 15);
    assert_eq!(settings.delivery.backoff_ms, 250);
    assert_eq!(settings.dispatch.concurrency, 2);
    assert_eq!(settings.cache.expiry_secs, 30);
    assert_eq!(settings.worker.poll_interval_ms, 100);
    // untouched keys keep their defaults
    assert_eq!(settings.worker.batch_size, 10);
}

#[test]
fn test_json_file() {
    let file = write_file(".json", r#"{"delivery": {"retries": 0}, "log": {"level": "debug"}}"#);

    let manager = ConfigManager::new();
    manager.load_file(file.path()).unwrap();
    let settings = RelaySettings::from_manager(&manager).unwrap();

    assert_eq!(settings.delivery.retries, 0);
    assert_eq!(settings.log.level, "debug");
}

#[test]
fn test_later_values_override_file() {
    let file = write_file(".env", "DELIVERY_RETRIES=7\nCACHE_EXPIRY_SECS=5\n");

    let manager = ConfigManager::new();
    manager.load_file(file.path()).unwrap();
    manager.set("delivery_retries", 2).unwrap();

    let settings = RelaySettings::from_manager(&manager).unwrap();
    assert_eq!(settings.delivery.retries, 2);
    assert_eq!(settings.cache.expiry_secs, 5);
}

#[test]
fn test_invalid_redis_url_rejected() {
    let file = write_file(".toml", "[cache]\nurl = \"http://not-redis\"\n");

    let manager = ConfigManager::new();
    manager.load_file(file.path()).unwrap();
    assert!(RelaySettings::from_manager(&manager).is_err());
}

#[test]
fn test_missing_file_is_load_error() {
    let manager = ConfigManager::new();
    assert!(manager.load_file(std::path::Path::new("/nonexistent/relay.toml")).is_err());
}
