//! Background transform worker setup

use crate::state::AppState;
use pictor_core::Config;
use pictor_worker::{TransformTaskHandler, Worker, WorkerHandle};
use std::sync::Arc;

/// Spawn the single queue consumer, unless disabled by configuration.
pub fn start_worker(config: &Config, state: &AppState) -> Option<WorkerHandle> {
    if !config.worker.enabled {
        tracing::info!("Transform worker disabled (WORKER_ENABLED=false)");
        return None;
    }

    let handler = TransformTaskHandler::new(
        state.cache.clone(),
        state.storage.clone(),
        state.images.clone(),
        state.transformed_images.clone(),
        config.mailbox_ttl(),
    );
    let worker = Worker::new(state.queue.clone(), Arc::new(handler), config.worker.clone());
    Some(worker.spawn())
}
