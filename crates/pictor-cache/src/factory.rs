use std::sync::Arc;

use pictor_core::{CacheBackend, Config};

use crate::{Cache, CacheResult, InMemoryCache};

/// Build the cache selected by `CACHE_BACKEND`.
pub async fn create_cache(config: &Config) -> CacheResult<Arc<dyn Cache>> {
    match config.cache_backend {
        #[cfg(feature = "cache-redis")]
        CacheBackend::Redis => {
            let cache = crate::RedisCache::new(&config.redis_url).await?;
            Ok(Arc::new(cache))
        }
        #[cfg(not(feature = "cache-redis"))]
        CacheBackend::Redis => Err(crate::CacheError::Connection(
            "Redis support not compiled in (enable the cache-redis feature)".to_string(),
        )),
        CacheBackend::Memory => {
            tracing::warn!("Using in-memory cache; queued tasks are lost on restart");
            Ok(Arc::new(InMemoryCache::new()))
        }
    }
}
