//! Blob storage and cache setup

use anyhow::{Context, Result};
use pictor_cache::{create_cache, Cache};
use pictor_core::Config;
use pictor_storage::{create_storage, Storage};
use std::sync::Arc;

pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    tracing::info!("Initializing storage...");
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;
    tracing::info!(backend = ?storage.backend_type(), "Storage initialized");
    Ok(storage)
}

pub async fn setup_cache(config: &Config) -> Result<Arc<dyn Cache>> {
    tracing::info!(backend = ?config.cache_backend, "Initializing cache...");
    let cache = create_cache(config)
        .await
        .context("Failed to initialize cache backend")?;
    tracing::info!("Cache initialized");
    Ok(cache)
}
