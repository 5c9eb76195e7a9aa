//! Pictor record store
//!
//! Repositories for source images and their transformed outputs. The
//! Postgres implementations are the source of truth; the in-memory ones
//! (behind `test-util`) let the HTTP surface and the worker be exercised
//! without a database.

pub mod db;

pub use db::{
    ImageRepository, ImageRepositoryTrait, TransformedImageRepository,
    TransformedImageRepositoryTrait,
};

#[cfg(any(test, feature = "test-util"))]
pub use db::memory::{InMemoryImageRepository, InMemoryTransformedImageRepository};
