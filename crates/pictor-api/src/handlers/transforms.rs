use crate::auth::UserContext;
use crate::error::{HttpAppError, ValidatedJson, ValidatedPath};
use crate::handlers::cache_aside;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use pictor_cache::keys;
use pictor_core::models::{MailboxEntry, TaskStatusResponse, TransformedImage};
use pictor_core::{TransformSpec, TransformTask};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformQueuedResponse {
    pub message: &'static str,
    pub task_id: Uuid,
}

/// Queue a transform and return immediately. The image itself is not read
/// here; a task for a missing image is dropped by the worker.
#[tracing::instrument(
    skip(state, spec),
    fields(user_id = %user.user_id, image_id = %image_id, operation = "submit_transform")
)]
pub async fn submit_transform(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    ValidatedPath(image_id): ValidatedPath<Uuid>,
    ValidatedJson(spec): ValidatedJson<TransformSpec>,
) -> Result<impl IntoResponse, HttpAppError> {
    let task = TransformTask::new(image_id, spec);
    state.queue.enqueue(&task).await?;

    tracing::info!(task_id = %task.task_id, "Transform task queued");

    Ok(Json(TransformQueuedResponse {
        message: "Image transform task queued",
        task_id: task.task_id,
    }))
}

/// Poll a task. The id is opaque here; anything without a published
/// result, including ids that were never issued, reports `Pending`.
#[tracing::instrument(skip(state, _user), fields(task_id = %task_id, operation = "transform_status"))]
pub async fn transform_status(
    State(state): State<Arc<AppState>>,
    _user: UserContext,
    ValidatedPath(task_id): ValidatedPath<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let entry = pictor_cache::json::get_json::<MailboxEntry>(
        state.cache.as_ref(),
        &keys::processed(&task_id),
    )
    .await?;

    let response = match entry {
        Some(entry) => TaskStatusResponse::completed(entry),
        None => TaskStatusResponse::pending(),
    };
    Ok(Json(response))
}

#[tracing::instrument(skip(state, _user), fields(image_id = %image_id, operation = "list_transforms"))]
pub async fn list_transforms(
    State(state): State<Arc<AppState>>,
    _user: UserContext,
    ValidatedPath(image_id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let key = keys::transformed_images(image_id);
    if let Some(images) =
        cache_aside::lookup::<Vec<TransformedImage>>(state.cache.as_ref(), &key).await
    {
        return Ok(Json(images));
    }

    let images = state.transformed_images.list_for_image(image_id).await?;
    cache_aside::store(
        state.cache.as_ref(),
        &key,
        &images,
        Some(state.uploads.derived_cache_ttl),
    )
    .await;

    Ok(Json(images))
}
