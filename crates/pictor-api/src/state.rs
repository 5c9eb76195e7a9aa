//! Application state shared by every handler.

use pictor_cache::Cache;
use pictor_db::{ImageRepositoryTrait, TransformedImageRepositoryTrait};
use pictor_storage::Storage;
use pictor_worker::TaskQueue;
use std::sync::Arc;
use std::time::Duration;

/// Limits and cache lifetimes applied on the request path.
#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub max_file_size: usize,
    /// TTL of the `imageIdToBuffer` / `imageIdToImage` entries written on upload.
    pub buffer_cache_ttl: Duration,
    /// TTL of the per-user image list.
    pub user_images_ttl: Duration,
    /// TTL of the single-image projection and the transforms list.
    pub derived_cache_ttl: Duration,
}

#[derive(Clone)]
pub struct AppState {
    pub images: Arc<dyn ImageRepositoryTrait>,
    pub transformed_images: Arc<dyn TransformedImageRepositoryTrait>,
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn Cache>,
    pub queue: TaskQueue,
    pub uploads: UploadConfig,
}
