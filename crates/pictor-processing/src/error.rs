use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    /// The source bytes are not a supported image.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    /// A single operation could not be applied. The pipeline recovers from
    /// this by skipping the operation.
    #[error("{operation} failed: {reason}")]
    Operation {
        operation: &'static str,
        reason: String,
    },
}

impl TransformError {
    pub fn operation(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::Operation {
            operation,
            reason: reason.into(),
        }
    }
}

pub type TransformResult<T> = Result<T, TransformError>;
