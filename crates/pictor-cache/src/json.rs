//! JSON helpers over [`Cache`] for typed cache-aside reads.

use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

use crate::{Cache, CacheError, CacheResult};

/// Read and decode a JSON value.
///
/// A value that no longer decodes is deleted and reported as a miss, so the
/// caller falls back to the record store and rewrites it.
pub async fn get_json<T: DeserializeOwned>(cache: &dyn Cache, key: &str) -> CacheResult<Option<T>> {
    let Some(raw) = cache.get(key).await? else {
        tracing::debug!(key = %key, "Cache MISS");
        return Ok(None);
    };

    match serde_json::from_slice(&raw) {
        Ok(value) => {
            tracing::debug!(key = %key, "Cache HIT");
            Ok(Some(value))
        }
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Failed to deserialize cached value");
            if let Err(del_err) = cache.del(key).await {
                tracing::warn!(key = %key, error = %del_err, "Failed to evict undecodable cache entry");
            }
            Ok(None)
        }
    }
}

/// Encode `value` as JSON and store it.
pub async fn set_json<T: Serialize + ?Sized>(
    cache: &dyn Cache,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) -> CacheResult<()> {
    let json = serde_json::to_vec(value).map_err(|e| CacheError::Serialization(e.to_string()))?;
    cache.set(key, &json, ttl).await
}
