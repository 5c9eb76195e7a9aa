//! Session authentication.
//!
//! Sessions are issued elsewhere; this module only verifies the HS256 token
//! and exposes the caller as a [`UserContext`].

pub mod middleware;
pub mod models;

pub use middleware::{auth_middleware, AuthState};
pub use models::{JwtClaims, UserContext};
