//! Redis cache backend.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::{Cache, CacheError, CacheResult};

/// Redis-backed cache. Cloning shares the underlying multiplexed connection.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    pub async fn new(redis_url: &str) -> CacheResult<Self> {
        info!("Connecting to Redis at {}", redis_url);

        let client = Client::open(redis_url).map_err(|e| {
            error!("Failed to create Redis client: {}", e);
            CacheError::Connection(format!("Redis client creation failed: {}", e))
        })?;

        let connection = ConnectionManager::new(client).await.map_err(|e| {
            error!("Failed to connect to Redis: {}", e);
            CacheError::Connection(format!("Redis connection failed: {}", e))
        })?;

        info!("Redis connection established");

        Ok(Self { connection })
    }
}

fn command_error(op: &str, key: &str, e: redis::RedisError) -> CacheError {
    warn!("Redis {} failed for {}: {}", op, key, e);
    CacheError::Command(format!("{} {}: {}", op, key, e))
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut conn = self.connection.clone();
        let value: Option<Vec<u8>> = conn
            .get(key)
            .await
            .map_err(|e| command_error("GET", key, e))?;
        debug!(key = %key, hit = value.is_some(), "Cache GET");
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> CacheResult<()> {
        let mut conn = self.connection.clone();
        match ttl {
            Some(ttl) => {
                // SETEX rejects a zero expiry
                let seconds = ttl.as_secs().max(1);
                let _: () = conn
                    .set_ex(key, value, seconds)
                    .await
                    .map_err(|e| command_error("SETEX", key, e))?;
            }
            None => {
                let _: () = conn
                    .set(key, value)
                    .await
                    .map_err(|e| command_error("SET", key, e))?;
            }
        }
        debug!(key = %key, size_bytes = value.len(), "Cache SET");
        Ok(())
    }

    async fn del(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.connection.clone();
        let _: () = conn
            .del(key)
            .await
            .map_err(|e| command_error("DEL", key, e))?;
        debug!(key = %key, "Cache DEL");
        Ok(())
    }

    async fn rpush(&self, list: &str, value: &[u8]) -> CacheResult<()> {
        let mut conn = self.connection.clone();
        let _: () = conn
            .rpush(list, value)
            .await
            .map_err(|e| command_error("RPUSH", list, e))?;
        Ok(())
    }

    async fn lpop(&self, list: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut conn = self.connection.clone();
        conn.lpop(list, None)
            .await
            .map_err(|e| command_error("LPOP", list, e))
    }

    async fn llen(&self, list: &str) -> CacheResult<usize> {
        let mut conn = self.connection.clone();
        conn.llen(list)
            .await
            .map_err(|e| command_error("LLEN", list, e))
    }

    async fn lrange(&self, list: &str, start: isize, stop: isize) -> CacheResult<Vec<Vec<u8>>> {
        let mut conn = self.connection.clone();
        conn.lrange(list, start, stop)
            .await
            .map_err(|e| command_error("LRANGE", list, e))
    }
}
