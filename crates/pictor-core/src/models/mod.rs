//! Data models for the application
//!
//! Records owned by the record store live in `image`; the queue mailbox and
//! status polling types live in `task`.

mod image;
mod task;

pub use image::{Image, ImageInfo, ImageProjection, NewImage, NewTransformedImage, TransformedImage};
pub use task::{MailboxEntry, TaskStatus, TaskStatusResponse};
