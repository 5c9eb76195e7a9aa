//! Pictor Storage Library
//!
//! Blob store abstraction with S3 (object_store) and local filesystem
//! implementations.
//!
//! # Storage key format
//!
//! - Uploaded originals: `uploads/{epoch_millis}_{filename}`
//! - Transform outputs: `transformed/{epoch_millis}_{basename(source_key)}`
//!
//! Keys must not contain `..` or a leading `/`. Key generation lives in the
//! `keys` module so uploads and the worker agree on the layout.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use pictor_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
