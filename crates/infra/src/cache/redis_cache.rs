//! Redis-backed validation cache.
//!
//! Uses a multiplexed [`ConnectionManager`], which reconnects on its own after
//! a dropped connection; every command error surfaces as
//! [`CacheError::Unavailable`] and the validator falls back to the store.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::{info, instrument};

use ims_inventory::{CacheError, ValidationCache};

#[derive(Clone)]
pub struct RedisValidationCache {
    conn: ConnectionManager,
}

impl RedisValidationCache {
    /// Connect to `redis_url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(redis_url: impl AsRef<str>) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url.as_ref()).map_err(unavailable)?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(unavailable)?;
        info!("redis validation cache connected");
        Ok(Self { conn })
    }
}

#[async_trait]
impl ValidationCache for RedisValidationCache {
    #[instrument(skip(self), err)]
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(unavailable)
    }

    /// Plain `SET` without `EX`: entries live until deleted.
    #[instrument(skip(self), err)]
    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.set(key, value).await.map_err(unavailable)
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.del(key).await.map_err(unavailable)
    }
}

fn unavailable(err: redis::RedisError) -> CacheError {
    CacheError::Unavailable(err.to_string())
}
