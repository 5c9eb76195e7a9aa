//! Pictor Core Library
//!
//! This crate provides the domain models, transform specification, error types
//! and configuration shared by every Pictor component.

pub mod backends;
pub mod config;
pub mod error;
pub mod models;
pub mod transform;

// Re-export commonly used types
pub use backends::{CacheBackend, StorageBackend};
pub use config::{BaseConfig, Config, WorkerConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use transform::{
    first_violation, Background, Crop, Filters, Resize, Rotate, TransformSpec, TransformTask,
    MAX_BLUR_SIGMA,
};
