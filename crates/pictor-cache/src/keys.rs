//! Cache key layout.
//!
//! | Key | Value |
//! |---|---|
//! | `imageId:{id}` | image projection (JSON) |
//! | `imageIdToBuffer:{id}` | raw source bytes |
//! | `imageIdToImage:{id}` | full image record (JSON) |
//! | `userIdToImages:{userId}` | list of projections (JSON) |
//! | `imageIdToTransformImages:{id}` | list of transformed images (JSON) |
//! | `processed:{taskId}` | mailbox entry (JSON) |

use std::fmt::Display;

/// List holding pending transform tasks.
pub const TASK_QUEUE: &str = "imageProcessingQueue";

/// List holding tasks the worker gave up on, with the reason.
pub const DEAD_LETTER_QUEUE: &str = "imageProcessingQueue:dead";

pub fn image_projection(image_id: impl Display) -> String {
    format!("imageId:{}", image_id)
}

pub fn image_buffer(image_id: impl Display) -> String {
    format!("imageIdToBuffer:{}", image_id)
}

pub fn image_record(image_id: impl Display) -> String {
    format!("imageIdToImage:{}", image_id)
}

pub fn user_images(user_id: impl Display) -> String {
    format!("userIdToImages:{}", user_id)
}

pub fn transformed_images(image_id: impl Display) -> String {
    format!("imageIdToTransformImages:{}", image_id)
}

pub fn processed(task_id: impl Display) -> String {
    format!("processed:{}", task_id)
}

/// Every per-image key that goes stale when the image is deleted.
pub fn image_keys(image_id: impl Display) -> [String; 4] {
    [
        image_projection(&image_id),
        image_buffer(&image_id),
        image_record(&image_id),
        transformed_images(&image_id),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_key_names() {
        let id = Uuid::nil();
        assert_eq!(
            image_projection(id),
            "imageId:00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(image_buffer(5), "imageIdToBuffer:5");
        assert_eq!(image_record(5), "imageIdToImage:5");
        assert_eq!(user_images(9), "userIdToImages:9");
        assert_eq!(transformed_images(5), "imageIdToTransformImages:5");
        assert_eq!(processed("abc"), "processed:abc");
    }

    #[test]
    fn test_image_keys_cover_all_per_image_entries() {
        let keys = image_keys(3);
        assert_eq!(
            keys,
            [
                "imageId:3".to_string(),
                "imageIdToBuffer:3".to_string(),
                "imageIdToImage:3".to_string(),
                "imageIdToTransformImages:3".to_string(),
            ]
        );
    }
}
