use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

/// Uploaded source image.
///
/// `is_deleted` is a tombstone: deleted images keep their row and blob, and
/// every read path filters them out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: Uuid,
    pub url: String,
    pub key: String,
    /// JSON text describing the decoded upload, see [`ImageInfo`].
    pub metadata: String,
    pub user_id: Uuid,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl Image {
    pub fn projection(&self) -> ImageProjection {
        ImageProjection {
            id: self.id,
            url: self.url.clone(),
            created_at: self.created_at,
        }
    }
}

/// Public view of an image: `{id, url, createdAt}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
#[serde(rename_all = "camelCase")]
pub struct ImageProjection {
    pub id: Uuid,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewImage {
    pub url: String,
    pub key: String,
    pub metadata: String,
    pub user_id: Uuid,
}

/// Output of one completed transform task. Rows are never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
#[serde(rename_all = "camelCase")]
pub struct TransformedImage {
    pub id: Uuid,
    pub url: String,
    pub key: String,
    pub metadata: String,
    pub image_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTransformedImage {
    pub url: String,
    pub key: String,
    pub metadata: String,
    pub image_id: Uuid,
}

/// Encoded image description stored as record metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub size: usize,
}

impl ImageInfo {
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
