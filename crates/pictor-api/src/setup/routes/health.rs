//! Health check handler.

use axum::{http::StatusCode, response::IntoResponse, Json};

/// Liveness check. Touches no dependency.
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}
