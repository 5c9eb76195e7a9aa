//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod storage;
pub mod worker;

use crate::state::{AppState, UploadConfig};
use anyhow::{Context, Result};
use pictor_core::Config;
use pictor_db::{ImageRepository, TransformedImageRepository};
use pictor_worker::{TaskQueue, WorkerHandle};
use std::sync::Arc;

/// Everything `main` needs to serve.
pub struct Application {
    pub state: Arc<AppState>,
    pub router: axum::Router,
    pub worker: Option<WorkerHandle>,
}

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<Application> {
    // Fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.is_production());
    tracing::info!(
        environment = %config.base.environment,
        "Configuration loaded and validated successfully"
    );

    let pool = database::setup_database(&config).await?;
    let storage = storage::setup_storage(&config).await?;
    let cache = storage::setup_cache(&config).await?;

    let state = Arc::new(AppState {
        images: Arc::new(ImageRepository::new(pool.clone())),
        transformed_images: Arc::new(TransformedImageRepository::new(pool)),
        storage,
        queue: TaskQueue::new(cache.clone()),
        cache,
        uploads: UploadConfig {
            max_file_size: config.max_file_size_bytes,
            buffer_cache_ttl: config.buffer_cache_ttl(),
            user_images_ttl: config.user_images_ttl(),
            derived_cache_ttl: config.derived_cache_ttl(),
        },
    });

    let router = routes::setup_routes(&config, state.clone())?;
    let worker = worker::start_worker(&config, &state);

    Ok(Application {
        state,
        router,
        worker,
    })
}
