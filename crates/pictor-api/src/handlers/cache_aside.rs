//! Best-effort cache helpers for the request path.
//!
//! The record store is the source of truth, so cache failures are logged
//! and treated as misses; they never fail a request.

use pictor_cache::json::{get_json, set_json};
use pictor_cache::Cache;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

pub async fn lookup<T: DeserializeOwned>(cache: &dyn Cache, key: &str) -> Option<T> {
    match get_json::<T>(cache, key).await {
        Ok(Some(value)) => {
            tracing::debug!(key = %key, "Cache hit");
            Some(value)
        }
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Cache read failed, falling back to store");
            None
        }
    }
}

pub async fn store<T: Serialize + ?Sized>(
    cache: &dyn Cache,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) {
    if let Err(e) = set_json(cache, key, value, ttl).await {
        tracing::warn!(key = %key, error = %e, "Cache write failed");
    }
}

pub async fn store_bytes(cache: &dyn Cache, key: &str, value: &[u8], ttl: Option<Duration>) {
    if let Err(e) = cache.set(key, value, ttl).await {
        tracing::warn!(key = %key, error = %e, "Cache write failed");
    }
}

pub async fn invalidate<K: AsRef<str>>(cache: &dyn Cache, keys: &[K]) {
    for key in keys {
        let key = key.as_ref();
        if let Err(e) = cache.del(key).await {
            tracing::warn!(key = %key, error = %e, "Cache invalidation failed");
        }
    }
}
