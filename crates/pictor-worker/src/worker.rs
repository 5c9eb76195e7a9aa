//! The single queue consumer.
//!
//! Each task runs inside its own error boundary: whatever happens to one
//! task is logged and the loop moves on. The loop sleeps for the poll
//! interval when the queue is empty and backs off exponentially while the
//! queue backend is unavailable.

use pictor_core::{TransformTask, WorkerConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use uuid::Uuid;

use crate::{Dequeued, TaskError, TaskHandler, TaskOutcome, TaskQueue};

/// Maximum delay in seconds between dequeue attempts while the queue
/// backend keeps failing.
pub const MAX_QUEUE_BACKOFF_SECS: u64 = 60;

/// Backoff in seconds after `failures` consecutive queue errors
/// (exponential with cap).
#[inline]
pub(crate) fn compute_queue_backoff_seconds(failures: u32) -> u64 {
    2_u64
        .checked_pow(failures)
        .unwrap_or(u64::MAX)
        .min(MAX_QUEUE_BACKOFF_SECS)
}

/// What one loop iteration did.
#[derive(Debug, Clone, PartialEq)]
pub enum Processed {
    /// The queue was empty.
    Idle,
    /// The queue backend could not be read.
    QueueUnavailable,
    Completed { task_id: Uuid },
    /// The source image was gone; the task was discarded.
    Dropped { task_id: Uuid },
    /// The task failed and was put back at the tail.
    Retried { task_id: Uuid, attempts: u32 },
    DeadLettered { reason: String },
}

#[derive(Clone)]
pub struct Worker {
    queue: TaskQueue,
    handler: Arc<dyn TaskHandler>,
    config: WorkerConfig,
}

/// Handle to a spawned worker. Dropping it also stops the loop.
pub struct WorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
    join: JoinHandle<()>,
}

impl WorkerHandle {
    /// Ask the loop to stop after the task in flight, and wait for it.
    pub async fn shutdown(self) {
        tracing::info!("Initiating worker shutdown");
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.join.await {
            tracing::error!(error = %e, "Worker task ended abnormally");
        }
    }
}

impl Worker {
    pub fn new(queue: TaskQueue, handler: Arc<dyn TaskHandler>, config: WorkerConfig) -> Self {
        Self {
            queue,
            handler,
            config,
        }
    }

    /// Start the consume loop on the runtime.
    pub fn spawn(self) -> WorkerHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let join = tokio::spawn(async move {
            self.run(shutdown_rx).await;
        });
        WorkerHandle { shutdown_tx, join }
    }

    async fn run(self, mut shutdown_rx: mpsc::Receiver<()>) {
        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);
        tracing::info!(
            poll_interval_ms = self.config.poll_interval_ms,
            max_retries = self.config.max_retries,
            "Transform worker started"
        );

        let mut queue_failures: u32 = 0;
        loop {
            match shutdown_rx.try_recv() {
                Ok(()) | Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => {}
            }

            let delay = match self.process_next().await {
                Processed::Idle => {
                    queue_failures = 0;
                    Some(poll_interval)
                }
                Processed::QueueUnavailable => {
                    queue_failures = queue_failures.saturating_add(1);
                    let backoff = Duration::from_secs(compute_queue_backoff_seconds(queue_failures));
                    Some(backoff.max(poll_interval))
                }
                _ => {
                    queue_failures = 0;
                    None
                }
            };

            if let Some(delay) = delay {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = sleep(delay) => {}
                }
            }
        }

        tracing::info!("Transform worker stopped");
    }

    /// Take one entry off the queue and process it. Never fails; every
    /// outcome is logged and reported.
    pub async fn process_next(&self) -> Processed {
        match self.queue.dequeue().await {
            Ok(None) => {
                tracing::trace!("No tasks available in queue");
                Processed::Idle
            }
            Ok(Some(Dequeued::Task(task))) => self.process_task(task).await,
            Ok(Some(Dequeued::Malformed { entry, reason })) => {
                tracing::warn!(reason = %reason, "Malformed queue entry");
                self.dead_letter(entry, reason).await
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to dequeue task");
                Processed::QueueUnavailable
            }
        }
    }

    #[tracing::instrument(skip(self, task), fields(task_id = %task.task_id, image_id = %task.image_id, attempts = task.attempts))]
    async fn process_task(&self, task: TransformTask) -> Processed {
        let task_id = task.task_id;

        let error = match self.handler.handle(&task).await {
            Ok(TaskOutcome::Completed(_)) => return Processed::Completed { task_id },
            Ok(TaskOutcome::ImageMissing) => {
                tracing::warn!("Source image not found or deleted, dropping task");
                return Processed::Dropped { task_id };
            }
            Err(e) => e,
        };

        let attempts = task.attempts.saturating_add(1);
        let unrecoverable = TaskError::is_unrecoverable(&error);
        tracing::error!(
            error = %error,
            attempts,
            max_retries = self.config.max_retries,
            unrecoverable,
            "Task execution failed"
        );

        if !unrecoverable && attempts < self.config.max_retries {
            let retry = TransformTask { attempts, ..task };
            return match self.queue.enqueue(&retry).await {
                Ok(()) => {
                    tracing::info!(attempts, "Task requeued for retry");
                    Processed::Retried { task_id, attempts }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to requeue task, task lost");
                    Processed::Dropped { task_id }
                }
            };
        }

        let reason = if unrecoverable {
            format!("unrecoverable: {}", error)
        } else {
            format!("failed after {} attempts: {}", attempts, error)
        };
        let retry = TransformTask { attempts, ..task };
        let entry = serde_json::to_value(&retry).unwrap_or(serde_json::Value::Null);
        self.dead_letter(entry, reason).await
    }

    async fn dead_letter(&self, entry: serde_json::Value, reason: String) -> Processed {
        if let Err(e) = self.queue.dead_letter(entry, reason.clone()).await {
            tracing::error!(error = %e, reason = %reason, "Failed to dead-letter entry, entry lost");
        }
        Processed::DeadLettered { reason }
    }
}
