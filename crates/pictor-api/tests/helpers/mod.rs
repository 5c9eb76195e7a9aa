//! Test helpers: build the router over in-memory infrastructure.
//!
//! No external services are needed: the cache and repositories live in
//! memory and blobs go to a temporary directory.

#![allow(dead_code)]

pub mod auth;
pub mod fixtures;

use axum_test::TestServer;
use pictor_api::setup::routes;
use pictor_api::state::{AppState, UploadConfig};
use pictor_cache::InMemoryCache;
use pictor_core::{BaseConfig, CacheBackend, Config, StorageBackend, WorkerConfig};
use pictor_db::{InMemoryImageRepository, InMemoryTransformedImageRepository};
use pictor_storage::LocalStorage;
use pictor_worker::{TaskQueue, TransformTaskHandler, Worker};
use std::sync::Arc;
use tempfile::TempDir;

/// Upload limit used by the test config.
pub const TEST_MAX_FILE_SIZE: usize = 256 * 1024;

/// Test application: server plus direct handles on the backing stores.
pub struct TestApp {
    pub server: TestServer,
    pub cache: InMemoryCache,
    pub images: InMemoryImageRepository,
    pub transformed: InMemoryTransformedImageRepository,
    pub storage: Arc<LocalStorage>,
    pub queue: TaskQueue,
    pub worker: Worker,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

pub fn create_test_config(storage_path: &str) -> Config {
    Config {
        base: BaseConfig {
            server_port: 0,
            cors_origins: vec!["*".to_string()],
            db_max_connections: 1,
            db_timeout_seconds: 1,
            jwt_secret: auth::TEST_JWT_SECRET.to_string(),
            environment: "test".to_string(),
        },
        database_url: "postgres://localhost/pictor_test".to_string(),
        cache_backend: CacheBackend::Memory,
        redis_url: "redis://localhost:6379".to_string(),
        mailbox_ttl_secs: 60,
        buffer_cache_ttl_secs: 60,
        user_images_ttl_secs: 30,
        derived_cache_ttl_secs: 3600,
        storage_backend: StorageBackend::Local,
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        local_storage_path: Some(storage_path.to_string()),
        local_storage_base_url: Some("http://localhost:8000/media".to_string()),
        max_file_size_bytes: TEST_MAX_FILE_SIZE,
        worker: WorkerConfig {
            enabled: false,
            poll_interval_ms: 10,
            max_retries: 3,
        },
    }
}

/// Setup a test app. The worker is not spawned; tests drive it with
/// `process_next` so every step is deterministic.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

/// Like [`setup_test_app`], with the config adjusted by `configure`.
pub async fn setup_test_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let storage = Arc::new(
        LocalStorage::new(temp_dir.path(), "http://localhost:8000/media".to_string())
            .await
            .expect("Failed to create local storage"),
    );
    let mut config = create_test_config(&temp_dir.path().display().to_string());
    configure(&mut config);

    let cache = InMemoryCache::new();
    let images = InMemoryImageRepository::new();
    let transformed = InMemoryTransformedImageRepository::new(images.clone());
    let queue = TaskQueue::new(Arc::new(cache.clone()));

    let state = Arc::new(AppState {
        images: Arc::new(images.clone()),
        transformed_images: Arc::new(transformed.clone()),
        storage: storage.clone(),
        cache: Arc::new(cache.clone()),
        queue: queue.clone(),
        uploads: UploadConfig {
            max_file_size: config.max_file_size_bytes,
            buffer_cache_ttl: config.buffer_cache_ttl(),
            user_images_ttl: config.user_images_ttl(),
            derived_cache_ttl: config.derived_cache_ttl(),
        },
    });

    let handler = TransformTaskHandler::new(
        state.cache.clone(),
        state.storage.clone(),
        state.images.clone(),
        state.transformed_images.clone(),
        config.mailbox_ttl(),
    );
    let worker = Worker::new(queue.clone(), Arc::new(handler), config.worker.clone());

    let router = routes::setup_routes(&config, state).expect("Failed to build routes");
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        cache,
        images,
        transformed,
        storage,
        queue,
        worker,
        _temp_dir: temp_dir,
    }
}
