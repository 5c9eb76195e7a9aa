//! Transform task queue over cache lists.
//!
//! `enqueue` appends to the tail of `imageProcessingQueue`; `dequeue` pops
//! the head without blocking. The pop is destructive: a task taken by a
//! worker that then crashes is lost.

use chrono::{DateTime, Utc};
use pictor_cache::keys::{DEAD_LETTER_QUEUE, TASK_QUEUE};
use pictor_cache::Cache;
use pictor_core::TransformTask;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::QueueResult;

const REQUIRED_FIELDS: [&str; 3] = ["taskId", "imageId", "transformPayload"];

/// One entry taken off the queue.
#[derive(Debug, Clone, PartialEq)]
pub enum Dequeued {
    Task(TransformTask),
    /// An entry that is not a usable task. `entry` holds the raw JSON, or
    /// the raw text when it was not JSON at all.
    Malformed { entry: Value, reason: String },
}

/// A task the worker gave up on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetter {
    pub reason: String,
    pub entry: Value,
    pub failed_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct TaskQueue {
    cache: Arc<dyn Cache>,
}

impl TaskQueue {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self { cache }
    }

    /// Append a task. Returns as soon as the entry is stored.
    #[tracing::instrument(skip(self, task), fields(task_id = %task.task_id, image_id = %task.image_id))]
    pub async fn enqueue(&self, task: &TransformTask) -> QueueResult<()> {
        let payload = serde_json::to_vec(task)?;
        self.cache.rpush(TASK_QUEUE, &payload).await?;

        tracing::info!(attempts = task.attempts, "Task enqueued");
        Ok(())
    }

    /// Pop the oldest entry, or `None` when the queue is empty.
    pub async fn dequeue(&self) -> QueueResult<Option<Dequeued>> {
        let Some(raw) = self.cache.lpop(TASK_QUEUE).await? else {
            return Ok(None);
        };
        Ok(Some(decode_entry(&raw)))
    }

    pub async fn len(&self) -> QueueResult<usize> {
        Ok(self.cache.llen(TASK_QUEUE).await?)
    }

    pub async fn is_empty(&self) -> QueueResult<bool> {
        Ok(self.len().await? == 0)
    }

    /// Park an entry on the dead-letter list with the reason it failed.
    pub async fn dead_letter(&self, entry: Value, reason: impl Into<String>) -> QueueResult<()> {
        let letter = DeadLetter {
            reason: reason.into(),
            entry,
            failed_at: Utc::now(),
        };
        let payload = serde_json::to_vec(&letter)?;
        self.cache.rpush(DEAD_LETTER_QUEUE, &payload).await?;

        tracing::warn!(reason = %letter.reason, "Entry moved to dead-letter queue");
        Ok(())
    }

    /// Every dead-lettered entry, oldest first.
    pub async fn dead_letters(&self) -> QueueResult<Vec<DeadLetter>> {
        let raw = self.cache.lrange(DEAD_LETTER_QUEUE, 0, -1).await?;
        Ok(raw
            .iter()
            .filter_map(|item| serde_json::from_slice(item).ok())
            .collect())
    }
}

/// Classify a raw queue entry. Presence of every wire field is checked
/// before decoding so the reason names the missing one.
pub fn decode_entry(raw: &[u8]) -> Dequeued {
    let value: Value = match serde_json::from_slice(raw) {
        Ok(value) => value,
        Err(e) => {
            return Dequeued::Malformed {
                entry: Value::String(String::from_utf8_lossy(raw).into_owned()),
                reason: format!("invalid JSON: {}", e),
            }
        }
    };

    if let Some(missing) = REQUIRED_FIELDS
        .iter()
        .find(|field| value.get(**field).map_or(true, Value::is_null))
    {
        return Dequeued::Malformed {
            reason: format!("missing {}", missing),
            entry: value,
        };
    }

    match serde_json::from_value::<TransformTask>(value.clone()) {
        Ok(task) => Dequeued::Task(task),
        Err(e) => Dequeued::Malformed {
            entry: value,
            reason: format!("invalid task: {}", e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pictor_cache::InMemoryCache;
    use pictor_core::TransformSpec;
    use serde_json::json;
    use uuid::Uuid;

    fn queue() -> (TaskQueue, InMemoryCache) {
        let cache = InMemoryCache::new();
        (TaskQueue::new(Arc::new(cache.clone())), cache)
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let (queue, _) = queue();
        let first = TransformTask::new(Uuid::new_v4(), TransformSpec::default());
        let second = TransformTask::new(Uuid::new_v4(), TransformSpec::default());
        queue.enqueue(&first).await.unwrap();
        queue.enqueue(&second).await.unwrap();
        assert_eq!(queue.len().await.unwrap(), 2);

        assert_eq!(queue.dequeue().await.unwrap(), Some(Dequeued::Task(first)));
        assert_eq!(queue.dequeue().await.unwrap(), Some(Dequeued::Task(second)));
        assert_eq!(queue.dequeue().await.unwrap(), None);
        assert!(queue.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_submissions_are_independent() {
        let (queue, _) = queue();
        let image_id = Uuid::new_v4();
        queue
            .enqueue(&TransformTask::new(image_id, TransformSpec::default()))
            .await
            .unwrap();
        queue
            .enqueue(&TransformTask::new(image_id, TransformSpec::default()))
            .await
            .unwrap();
        assert_eq!(queue.len().await.unwrap(), 2);
    }

    #[test]
    fn test_decode_missing_image_id() {
        let raw = serde_json::to_vec(&json!({
            "taskId": Uuid::new_v4(),
            "transformPayload": {}
        }))
        .unwrap();
        match decode_entry(&raw) {
            Dequeued::Malformed { reason, entry } => {
                assert_eq!(reason, "missing imageId");
                assert!(entry.get("taskId").is_some());
            }
            other => panic!("expected malformed entry, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_null_payload_is_missing() {
        let raw = serde_json::to_vec(&json!({
            "taskId": Uuid::new_v4(),
            "imageId": Uuid::new_v4(),
            "transformPayload": null
        }))
        .unwrap();
        assert!(matches!(
            decode_entry(&raw),
            Dequeued::Malformed { reason, .. } if reason == "missing transformPayload"
        ));
    }

    #[test]
    fn test_decode_not_json() {
        match decode_entry(b"{not json") {
            Dequeued::Malformed { entry, reason } => {
                assert_eq!(entry, json!("{not json"));
                assert!(reason.starts_with("invalid JSON"));
            }
            other => panic!("expected malformed entry, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_bad_uuid() {
        let raw = serde_json::to_vec(&json!({
            "taskId": "not-a-uuid",
            "imageId": Uuid::new_v4(),
            "transformPayload": {}
        }))
        .unwrap();
        assert!(matches!(
            decode_entry(&raw),
            Dequeued::Malformed { reason, .. } if reason.starts_with("invalid task")
        ));
    }

    #[tokio::test]
    async fn test_dead_letters_are_listed() {
        let (queue, cache) = queue();
        queue
            .dead_letter(json!({"taskId": "x"}), "missing imageId")
            .await
            .unwrap();

        let letters = queue.dead_letters().await.unwrap();
        assert_eq!(letters.len(), 1);
        assert_eq!(letters[0].reason, "missing imageId");
        assert_eq!(cache.llen(DEAD_LETTER_QUEUE).await.unwrap(), 1);
        // the live queue is untouched
        assert!(queue.is_empty().await.unwrap());
    }
}
