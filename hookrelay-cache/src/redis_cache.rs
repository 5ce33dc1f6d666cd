//! Redis-backed store for relays sharing one subscriber cache

use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult};
use crate::traits::CacheStore;
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::time::Duration;
use tracing::info;

/// Cache store over a multiplexed Redis connection.
///
/// Expiring entries are written with a single `SET .. EX`, never a `SET`
/// followed by `EXPIRE`.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
    config: CacheConfig,
}

impl RedisCache {
    pub async fn new(config: CacheConfig) -> CacheResult<Self> {
        let Some(url) = config.url.as_deref() else {
            return Err(CacheError::Config("redis backend needs `url`".to_string()));
        };

        let client = Client::open(url).map_err(|e| CacheError::Connection(e.to_string()))?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        info!(target: "hookrelay::cache", url = %url, "Redis cache connected");

        Ok(Self { connection, config })
    }

    fn conn(&self) -> ConnectionManager {
        self.connection.clone()
    }
}

/// Redis rejects `EX 0`, so anything under a second becomes one second.
fn expiry_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get_json(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.conn().get(self.config.build_key(key)).await?)
    }

    async fn set_json(&self, key: &str, value: String, ttl: Option<Duration>) -> CacheResult<()> {
        let key = self.config.build_key(key);
        let mut conn = self.conn();
        match ttl.or(self.config.default_ttl) {
            Some(ttl) => conn.set_ex::<_, _, ()>(&key, value, expiry_secs(ttl)).await?,
            None => conn.set::<_, _, ()>(&key, value).await?,
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.conn().del::<_, ()>(self.config.build_key(key)).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.conn().exists(self.config.build_key(key)).await?)
    }

    async fn clear(&self) -> CacheResult<()> {
        let mut conn = self.conn();
        redis::cmd("FLUSHDB").query_async::<()>(&mut conn).await?;
        Ok(())
    }

    async fn ttl(&self, key: &str) -> CacheResult<Option<Duration>> {
        // TTL answers -2 for a missing key and -1 for one without expiry
        let remaining: i64 = self.conn().ttl(self.config.build_key(key)).await?;
        Ok(u64::try_from(remaining)
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs))
    }
}
