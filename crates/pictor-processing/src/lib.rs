//! Pictor Processing Library
//!
//! The transform engine is a pure, synchronous function from encoded bytes
//! and a [`pictor_core::TransformSpec`] to encoded bytes and metadata. It is
//! CPU bound; async callers should run it on the blocking pool.

pub mod codec;
pub mod engine;
pub mod error;
pub mod filters;
pub mod geometry;

pub use codec::describe;
pub use engine::{transform, TransformOutput};
pub use error::{TransformError, TransformResult};
pub use filters::ImageFilters;
pub use geometry::ImageGeometry;
