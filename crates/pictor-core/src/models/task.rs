use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::TransformedImage;

/// Result published under `processed:{taskId}` once a task completes.
///
/// `metadata` is kept as JSON text so pollers receive exactly what the
/// record store holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailboxEntry {
    pub id: Uuid,
    pub url: String,
    pub metadata: String,
}

impl From<&TransformedImage> for MailboxEntry {
    fn from(image: &TransformedImage) -> Self {
        Self {
            id: image.id,
            url: image.url.clone(),
            metadata: image.metadata.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatusResponse {
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<MailboxEntry>,
}

impl TaskStatusResponse {
    pub fn pending() -> Self {
        Self {
            status: TaskStatus::Pending,
            image: None,
        }
    }

    pub fn completed(image: MailboxEntry) -> Self {
        Self {
            status: TaskStatus::Completed,
            image: Some(image),
        }
    }
}
