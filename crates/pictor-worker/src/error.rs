use pictor_cache::CacheError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue backend error: {0}")]
    Cache(#[from] CacheError),

    #[error("Queue serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type QueueResult<T> = Result<T, QueueError>;

/// Failure raised by a task handler.
///
/// Recoverable failures are retried up to the configured limit;
/// unrecoverable ones go straight to the dead-letter list. Handlers return
/// it inside `anyhow::Error`; any other error is treated as recoverable.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct TaskError {
    #[source]
    source: anyhow::Error,
    recoverable: bool,
}

impl TaskError {
    pub fn recoverable(source: impl Into<anyhow::Error>) -> Self {
        Self {
            source: source.into(),
            recoverable: true,
        }
    }

    pub fn unrecoverable(source: impl Into<anyhow::Error>) -> Self {
        Self {
            source: source.into(),
            recoverable: false,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.recoverable
    }

    /// Whether `err` carries an unrecoverable [`TaskError`].
    pub fn is_unrecoverable(err: &anyhow::Error) -> bool {
        err.downcast_ref::<TaskError>()
            .map(|te| !te.is_recoverable())
            .unwrap_or(false)
    }
}
