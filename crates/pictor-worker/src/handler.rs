//! Task handlers.
//!
//! [`TransformTaskHandler`] resolves the source bytes cache-first, runs the
//! transform engine on the blocking pool, stores the output and publishes
//! the result to the task mailbox.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use pictor_cache::json::{get_json, set_json};
use pictor_cache::{keys, Cache};
use pictor_core::models::{Image, MailboxEntry, NewTransformedImage};
use pictor_core::TransformTask;
use pictor_db::{ImageRepositoryTrait, TransformedImageRepositoryTrait};
use pictor_processing::TransformError;
use pictor_storage::keys::{content_type_for_key, transformed_key};
use pictor_storage::{Storage, StorageError};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::TaskError;

#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// The output was stored and published under `processed:{taskId}`.
    Completed(MailboxEntry),
    /// The source image no longer exists; nothing to do.
    ImageMissing,
}

/// Processes one task.
///
/// Errors wrapping an unrecoverable [`TaskError`] are dead-lettered; any
/// other error is retried.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, task: &TransformTask) -> Result<TaskOutcome>;
}

pub struct TransformTaskHandler {
    cache: Arc<dyn Cache>,
    storage: Arc<dyn Storage>,
    images: Arc<dyn ImageRepositoryTrait>,
    transformed: Arc<dyn TransformedImageRepositoryTrait>,
    mailbox_ttl: Duration,
}

impl TransformTaskHandler {
    pub fn new(
        cache: Arc<dyn Cache>,
        storage: Arc<dyn Storage>,
        images: Arc<dyn ImageRepositoryTrait>,
        transformed: Arc<dyn TransformedImageRepositoryTrait>,
        mailbox_ttl: Duration,
    ) -> Self {
        Self {
            cache,
            storage,
            images,
            transformed,
            mailbox_ttl,
        }
    }

    async fn cached_buffer(&self, image_id: Uuid) -> Option<Vec<u8>> {
        match self.cache.get(&keys::image_buffer(image_id)).await {
            Ok(buffer) => buffer,
            Err(e) => {
                tracing::warn!(image_id = %image_id, error = %e, "Buffer cache read failed");
                None
            }
        }
    }

    /// The live image record, from the cache when possible.
    async fn load_image(&self, image_id: Uuid) -> Result<Option<Image>> {
        match get_json::<Image>(self.cache.as_ref(), &keys::image_record(image_id)).await {
            Ok(Some(image)) if !image.is_deleted => return Ok(Some(image)),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(image_id = %image_id, error = %e, "Image record cache read failed");
            }
        }

        self.images
            .find_active(image_id)
            .await
            .map_err(|e| TaskError::recoverable(anyhow!(e)).into())
    }

    /// Invalidate the derived list and write the mailbox. Failures are
    /// logged only.
    async fn publish(&self, task: &TransformTask, entry: &MailboxEntry) {
        if let Err(e) = self.cache.del(&keys::transformed_images(task.image_id)).await {
            tracing::warn!(
                image_id = %task.image_id,
                error = %e,
                "Failed to invalidate transformed images cache"
            );
        }

        if let Err(e) = set_json(
            self.cache.as_ref(),
            &keys::processed(task.task_id),
            entry,
            Some(self.mailbox_ttl),
        )
        .await
        {
            tracing::error!(
                task_id = %task.task_id,
                transformed_id = %entry.id,
                error = %e,
                "Failed to publish task result; pollers will see Pending"
            );
        }
    }

    /// Source record and bytes, or `None` when the image is gone.
    async fn resolve_source(&self, image_id: Uuid) -> Result<Option<(Image, Vec<u8>)>> {
        let buffer = self.cached_buffer(image_id).await;

        let Some(image) = self.load_image(image_id).await? else {
            return Ok(None);
        };

        if let Some(buffer) = buffer {
            tracing::debug!(image_id = %image_id, "Source bytes served from cache");
            return Ok(Some((image, buffer)));
        }

        match self.storage.download(&image.key).await {
            Ok(bytes) => Ok(Some((image, bytes))),
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(e) => Err(TaskError::recoverable(e).into()),
        }
    }
}

#[async_trait]
impl TaskHandler for TransformTaskHandler {
    #[tracing::instrument(skip(self, task), fields(task_id = %task.task_id, image_id = %task.image_id))]
    async fn handle(&self, task: &TransformTask) -> Result<TaskOutcome> {
        let Some((image, source)) = self.resolve_source(task.image_id).await? else {
            return Ok(TaskOutcome::ImageMissing);
        };

        let spec = task.transform_payload.clone();
        let output = tokio::task::spawn_blocking(move || pictor_processing::transform(&source, &spec))
            .await
            .map_err(|e| TaskError::unrecoverable(anyhow!("transform panicked: {}", e)))?
            .map_err(|e| match e {
                TransformError::Decode(_) | TransformError::Encode(_) => TaskError::unrecoverable(e),
                TransformError::Operation { .. } => TaskError::recoverable(e),
            })?;

        let key = transformed_key(&image.key);
        let content_type = content_type_for_key(&image.key);
        let url = self
            .storage
            .upload_with_key(&key, output.data, &content_type)
            .await
            .map_err(TaskError::recoverable)?;

        let record = match self
            .transformed
            .create(NewTransformedImage {
                url,
                key: key.clone(),
                metadata: output.info.to_json_string(),
                image_id: task.image_id,
            })
            .await
        {
            Ok(record) => record,
            Err(e) => {
                // The retry uploads under a fresh key
                if let Err(cleanup_err) = self.storage.delete(&key).await {
                    tracing::warn!(
                        error = %cleanup_err,
                        key = %key,
                        "Failed to cleanup transformed blob after record error"
                    );
                }
                return Err(TaskError::recoverable(anyhow!(e)).into());
            }
        };

        // Record committed: publishing is best effort
        let entry = MailboxEntry::from(&record);
        self.publish(task, &entry).await;

        tracing::info!(
            transformed_id = %record.id,
            key = %record.key,
            skipped = ?output.skipped,
            "Transform task completed"
        );

        Ok(TaskOutcome::Completed(entry))
    }
}
