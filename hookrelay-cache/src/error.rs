//! Cache store failures

use thiserror::Error;

pub type CacheResult<T> = Result<T, CacheError>;

/// Why a cache store call failed.
///
/// Callers in the relay treat every variant as a miss, so none of them is
/// fatal on the read path.
#[derive(Debug, Error)]
pub enum CacheError {
    #[cfg(feature = "redis")]
    #[error("redis command failed: {0}")]
    Redis(#[from] redis::RedisError),

    /// Value could not be encoded as JSON before storing
    #[error("cannot encode cache value: {0}")]
    Serialization(String),

    /// Stored JSON did not match the requested type
    #[error("cannot decode cache value: {0}")]
    Deserialization(String),

    /// Backend unreachable
    #[error("cache backend unreachable: {0}")]
    Connection(String),

    #[error("invalid cache configuration: {0}")]
    Config(String),
}
