//! Pictor Cache Library
//!
//! A small key-value store with optional TTL plus list primitives. The API
//! uses it as a read-through accelerator and as the task mailbox; the worker
//! uses its lists as the durable FIFO queue.
//!
//! Key names are built in [`keys`] so request handlers and the worker agree
//! on what to invalidate.

pub mod factory;
pub mod json;
pub mod keys;
pub mod memory;
#[cfg(feature = "cache-redis")]
pub mod redis_cache;
pub mod traits;

pub use factory::create_cache;
pub use memory::InMemoryCache;
#[cfg(feature = "cache-redis")]
pub use redis_cache::RedisCache;
pub use traits::{Cache, CacheError, CacheResult};
