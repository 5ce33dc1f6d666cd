//! Errors raised while assembling or running the relay

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] hookrelay_config::ConfigError),

    #[error(transparent)]
    Relay(#[from] hookrelay_webhooks::RelayError),

    #[error(transparent)]
    Cache(#[from] hookrelay_cache::CacheError),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
