//! Database repositories for data access layer
//!
//! Each repository owns one table and exposes a trait so callers can hold an
//! `Arc<dyn ...>` and swap in the in-memory implementation for tests.

pub mod image;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod transformed_image;

pub use image::{ImageRepository, ImageRepositoryTrait};
pub use transformed_image::{TransformedImageRepository, TransformedImageRepositoryTrait};
