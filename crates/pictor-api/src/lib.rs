//! Pictor API Library
//!
//! HTTP handlers, authentication and application setup. The binary wires
//! these to Postgres, the configured blob store and cache, and runs the
//! transform worker in the same process.

mod handlers;
mod telemetry;

pub mod auth;
pub mod error;
pub mod setup;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
