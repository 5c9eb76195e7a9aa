use crate::auth::UserContext;
use crate::error::{HttpAppError, ValidatedPath};
use crate::handlers::{cache_aside, IMAGE_NOT_FOUND};
use crate::state::AppState;
use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use pictor_cache::keys;
use pictor_core::models::{ImageProjection, NewImage};
use pictor_core::AppError;
use pictor_storage::keys::{content_type_for_key, upload_key};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Multipart field carrying the upload.
const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMessageResponse {
    pub message: &'static str,
    pub image_id: Uuid,
}

struct UploadedFile {
    filename: String,
    content_type: Option<String>,
    data: Bytes,
}

async fn read_file_field(multipart: &mut Multipart) -> Result<Option<UploadedFile>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or("image").to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read upload: {}", e)))?;
        return Ok(Some(UploadedFile {
            filename,
            content_type,
            data,
        }));
    }
    Ok(None)
}

#[tracing::instrument(skip(state, multipart), fields(user_id = %user.user_id, operation = "upload_image"))]
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let file = read_file_field(&mut multipart)
        .await?
        .filter(|file| !file.data.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Please upload image file".to_string()))?;

    let max = state.uploads.max_file_size;
    if file.data.len() > max {
        return Err(AppError::PayloadTooLarge(format!(
            "File exceeds maximum size of {} bytes",
            max
        ))
        .into());
    }

    let data = file.data.clone();
    let info = tokio::task::spawn_blocking(move || pictor_processing::describe(&data))
        .await
        .map_err(|e| AppError::Internal(format!("Image inspection task failed: {}", e)))??;

    let key = upload_key(&file.filename);
    let content_type = file
        .content_type
        .unwrap_or_else(|| content_type_for_key(&key));
    let url = state
        .storage
        .upload_with_key(&key, file.data.to_vec(), &content_type)
        .await?;

    let image = state
        .images
        .create(NewImage {
            url,
            key,
            metadata: info.to_json_string(),
            user_id: user.user_id,
        })
        .await?;

    let ttl = Some(state.uploads.buffer_cache_ttl);
    let cache = state.cache.as_ref();
    cache_aside::store_bytes(cache, &keys::image_buffer(image.id), &file.data, ttl).await;
    cache_aside::store(cache, &keys::image_record(image.id), &image, ttl).await;
    cache_aside::invalidate(cache, &[keys::user_images(user.user_id)]).await;

    tracing::info!(
        image_id = %image.id,
        key = %image.key,
        format = %info.format,
        width = info.width,
        height = info.height,
        size_bytes = info.size,
        "Image uploaded"
    );

    Ok(Json(ImageMessageResponse {
        message: "Upload successfully!",
        image_id: image.id,
    }))
}

#[tracing::instrument(skip(state), fields(user_id = %user.user_id, operation = "list_images"))]
pub async fn list_images(
    State(state): State<Arc<AppState>>,
    user: UserContext,
) -> Result<impl IntoResponse, HttpAppError> {
    let key = keys::user_images(user.user_id);
    if let Some(images) = cache_aside::lookup::<Vec<ImageProjection>>(state.cache.as_ref(), &key).await {
        return Ok(Json(images));
    }

    let images = state.images.list_active_by_user(user.user_id).await?;
    cache_aside::store(
        state.cache.as_ref(),
        &key,
        &images,
        Some(state.uploads.user_images_ttl),
    )
    .await;

    Ok(Json(images))
}

#[tracing::instrument(skip(state), fields(image_id = %id, operation = "get_image"))]
pub async fn get_image(
    State(state): State<Arc<AppState>>,
    _user: UserContext,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let key = keys::image_projection(id);
    if let Some(image) = cache_aside::lookup::<ImageProjection>(state.cache.as_ref(), &key).await {
        return Ok(Json(image));
    }

    let image = state
        .images
        .find_active(id)
        .await?
        .ok_or_else(|| AppError::NotFound(IMAGE_NOT_FOUND.to_string()))?
        .projection();
    cache_aside::store(
        state.cache.as_ref(),
        &key,
        &image,
        Some(state.uploads.derived_cache_ttl),
    )
    .await;

    Ok(Json(image))
}

/// Soft delete. The blob is retained; every cache entry derived from the
/// image is dropped.
#[tracing::instrument(skip(state), fields(image_id = %id, operation = "delete_image"))]
pub async fn delete_image(
    State(state): State<Arc<AppState>>,
    _user: UserContext,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let image = state
        .images
        .find_active(id)
        .await?
        .ok_or_else(|| AppError::NotFound(IMAGE_NOT_FOUND.to_string()))?;

    if !state.images.soft_delete(id).await? {
        return Err(AppError::NotFound(IMAGE_NOT_FOUND.to_string()).into());
    }

    let cache = state.cache.as_ref();
    cache_aside::invalidate(cache, &keys::image_keys(id)).await;
    cache_aside::invalidate(cache, &[keys::user_images(image.user_id)]).await;

    tracing::info!(image_id = %id, "Image soft-deleted");

    Ok(Json(ImageMessageResponse {
        message: "Image deleted successfully",
        image_id: id,
    }))
}
