pub mod cache_aside;
pub mod images;
pub mod transforms;

/// Message returned for both missing and soft-deleted images.
pub(crate) const IMAGE_NOT_FOUND: &str = "Image not found or already deleted";
