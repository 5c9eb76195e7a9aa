//! Cache abstraction trait

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Cache operation errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache connection failed: {0}")]
    Connection(String),

    #[error("Cache command failed: {0}")]
    Command(String),

    #[error("Cache serialization failed: {0}")]
    Serialization(String),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Key-value store with optional per-key TTL and FIFO list primitives.
///
/// Every call is a single independent key operation; there are no
/// multi-key transactions.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Fetch a value. Expired and missing keys both yield `None`.
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Store a value, replacing any previous one. `ttl = None` keeps the
    /// key until it is deleted.
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> CacheResult<()>;

    /// Remove a key. Removing a missing key is not an error.
    async fn del(&self, key: &str) -> CacheResult<()>;

    /// Append a value to the tail of a list.
    async fn rpush(&self, list: &str, value: &[u8]) -> CacheResult<()>;

    /// Pop from the head of a list without blocking.
    async fn lpop(&self, list: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Number of values in a list.
    async fn llen(&self, list: &str) -> CacheResult<usize>;

    /// Values between `start` and `stop` inclusive; negative indexes count
    /// from the tail, as in Redis `LRANGE`.
    async fn lrange(&self, list: &str, start: isize, stop: isize) -> CacheResult<Vec<Vec<u8>>>;
}
