//! Transform submission, worker processing and polling.
//!
//! Run with: `cargo test -p pictor-api --test transforms_test`

mod helpers;

use helpers::auth::{test_user, TestUser};
use helpers::fixtures::{create_test_png, file_form};
use helpers::{setup_test_app, TestApp};
use pictor_cache::keys;
use pictor_cache::Cache;
use pictor_storage::Storage;
use pictor_worker::Processed;
use serde_json::{json, Value};
use uuid::Uuid;

async fn upload(app: &TestApp, user: &TestUser, width: u32, height: u32) -> Uuid {
    let body: Value = app
        .client()
        .post("/images")
        .add_header("Authorization", user.bearer())
        .multipart(file_form(create_test_png(width, height), "photo.png", "image/png"))
        .await
        .json();
    serde_json::from_value(body["imageId"].clone()).unwrap()
}

async fn submit(app: &TestApp, user: &TestUser, image_id: Uuid, spec: Value) -> Uuid {
    let response = app
        .client()
        .post(&format!("/images/{}/transform", image_id))
        .add_header("Authorization", user.bearer())
        .json(&spec)
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["message"], "Image transform task queued");
    serde_json::from_value(body["taskId"].clone()).unwrap()
}

async fn status(app: &TestApp, user: &TestUser, task_id: Uuid) -> Value {
    let response = app
        .client()
        .get(&format!("/images/transform/{}", task_id))
        .add_header("Authorization", user.bearer())
        .await;
    assert_eq!(response.status_code(), 200);
    response.json()
}

#[tokio::test]
async fn test_submit_returns_immediately_and_polls_pending() {
    let app = setup_test_app().await;
    let user = test_user();
    let image_id = upload(&app, &user, 20, 20).await;

    let task_id = submit(&app, &user, image_id, json!({"blur": 2.0})).await;

    // nothing has been processed yet
    assert_eq!(app.queue.len().await.unwrap(), 1);
    assert_eq!(status(&app, &user, task_id).await, json!({"status": "Pending"}));
    assert!(app.transformed.all().is_empty());
}

#[tokio::test]
async fn test_unknown_task_is_pending() {
    let app = setup_test_app().await;
    let user = test_user();
    assert_eq!(
        status(&app, &user, Uuid::new_v4()).await,
        json!({"status": "Pending"})
    );
}

#[tokio::test]
async fn test_non_uuid_task_id_is_pending() {
    let app = setup_test_app().await;
    let user = test_user();

    let response = app
        .client()
        .get("/images/transform/not-a-uuid-task")
        .add_header("Authorization", user.bearer())
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<Value>(), json!({"status": "Pending"}));
}

#[tokio::test]
async fn test_invalid_spec_reports_first_violation() {
    let app = setup_test_app().await;
    let user = test_user();
    let image_id = upload(&app, &user, 20, 20).await;

    let response = app
        .client()
        .post(&format!("/images/{}/transform", image_id))
        .add_header("Authorization", user.bearer())
        .json(&json!({"resize": {"width": 0, "height": 10}, "blur": -1.0}))
        .await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["message"], "resize.width: must be at least 1");
    assert!(app.queue.is_empty().await.unwrap());
}

#[tokio::test]
async fn test_oversized_blur_is_rejected() {
    let app = setup_test_app().await;
    let user = test_user();
    let image_id = upload(&app, &user, 20, 20).await;

    let response = app
        .client()
        .post(&format!("/images/{}/transform", image_id))
        .add_header("Authorization", user.bearer())
        .json(&json!({"blur": 2000.0}))
        .await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["message"], "blur: must be between 0 and 1000");
    assert!(app.queue.is_empty().await.unwrap());
}

#[tokio::test]
async fn test_unknown_operation_is_rejected() {
    let app = setup_test_app().await;
    let user = test_user();

    let response = app
        .client()
        .post(&format!("/images/{}/transform", Uuid::new_v4()))
        .add_header("Authorization", user.bearer())
        .json(&json!({"sharpen": 3}))
        .await;
    assert_eq!(response.status_code(), 400);
    assert_eq!(response.json::<Value>()["code"], "INVALID_INPUT");
    assert!(app.queue.is_empty().await.unwrap());
}

#[tokio::test]
async fn test_completed_task_is_published_and_listed() {
    let app = setup_test_app().await;
    let user = test_user();
    let image_id = upload(&app, &user, 64, 48).await;
    let transforms_path = format!("/images/{}/transforms", image_id);

    // prime the derived-list cache with the empty list
    let list: Vec<Value> = app
        .client()
        .get(&transforms_path)
        .add_header("Authorization", user.bearer())
        .await
        .json();
    assert!(list.is_empty());
    assert!(app
        .cache
        .get(&keys::transformed_images(image_id))
        .await
        .unwrap()
        .is_some());

    let task_id = submit(
        &app,
        &user,
        image_id,
        json!({"crop": {"width": 40, "height": 40, "x": 0, "y": 0}, "resize": {"width": 20, "height": 10}}),
    )
    .await;
    assert_eq!(
        app.worker.process_next().await,
        Processed::Completed { task_id }
    );

    let body = status(&app, &user, task_id).await;
    assert_eq!(body["status"], "Completed");
    let metadata: Value =
        serde_json::from_str(body["image"]["metadata"].as_str().unwrap()).unwrap();
    assert_eq!(metadata["width"], 20);
    assert_eq!(metadata["height"], 10);

    let list: Vec<Value> = app
        .client()
        .get(&transforms_path)
        .add_header("Authorization", user.bearer())
        .await
        .json();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["imageId"], image_id.to_string());
    assert_eq!(list[0]["id"], body["image"]["id"]);
    assert!(list[0]["key"].as_str().unwrap().starts_with("transformed/"));
}

#[tokio::test]
async fn test_blur_changes_pixels_and_is_deterministic() {
    let app = setup_test_app().await;
    let user = test_user();
    let image_id = upload(&app, &user, 48, 48).await;

    let first = submit(&app, &user, image_id, json!({"blur": 5.0})).await;
    let second = submit(&app, &user, image_id, json!({"blur": 5.0})).await;
    assert_ne!(first, second);

    assert_eq!(app.worker.process_next().await, Processed::Completed { task_id: first });
    assert_eq!(app.worker.process_next().await, Processed::Completed { task_id: second });

    let rows = app.transformed.all();
    assert_eq!(rows.len(), 2);
    let a = app.storage.download(&rows[0].key).await.unwrap();
    let b = app.storage.download(&rows[1].key).await.unwrap();
    assert_eq!(a, b);

    let source = image::load_from_memory(&create_test_png(48, 48)).unwrap().to_rgb8();
    let blurred = image::load_from_memory(&a).unwrap().to_rgb8();
    assert_eq!(source.dimensions(), blurred.dimensions());
    assert_ne!(source.as_raw(), blurred.as_raw());
}

#[tokio::test]
async fn test_grayscale_wins_over_sepia() {
    let app = setup_test_app().await;
    let user = test_user();
    let image_id = upload(&app, &user, 16, 16).await;

    let task_id = submit(
        &app,
        &user,
        image_id,
        json!({"filters": {"grayscale": true, "sepia": true}}),
    )
    .await;
    assert_eq!(app.worker.process_next().await, Processed::Completed { task_id });

    let row = &app.transformed.all()[0];
    let output = image::load_from_memory(&app.storage.download(&row.key).await.unwrap())
        .unwrap()
        .to_rgb8();
    assert!(output.pixels().all(|p| p[0] == p[1] && p[1] == p[2]));
}

#[tokio::test]
async fn test_task_for_deleted_image_stays_pending() {
    let app = setup_test_app().await;
    let user = test_user();
    let image_id = upload(&app, &user, 16, 16).await;

    let task_id = submit(&app, &user, image_id, json!({"blur": 1.0})).await;
    let response = app
        .client()
        .delete(&format!("/images/{}", image_id))
        .add_header("Authorization", user.bearer())
        .await;
    assert_eq!(response.status_code(), 200);

    assert_eq!(app.worker.process_next().await, Processed::Dropped { task_id });
    assert_eq!(status(&app, &user, task_id).await["status"], "Pending");
    assert!(app.transformed.all().is_empty());
}

#[tokio::test]
async fn test_transforms_of_deleted_image_are_hidden() {
    let app = setup_test_app().await;
    let user = test_user();
    let image_id = upload(&app, &user, 16, 16).await;

    let task_id = submit(&app, &user, image_id, json!({})).await;
    assert_eq!(app.worker.process_next().await, Processed::Completed { task_id });

    app.client()
        .delete(&format!("/images/{}", image_id))
        .add_header("Authorization", user.bearer())
        .await;

    let list: Vec<Value> = app
        .client()
        .get(&format!("/images/{}/transforms", image_id))
        .add_header("Authorization", user.bearer())
        .await
        .json();
    assert!(list.is_empty());
    assert_eq!(app.transformed.all().len(), 1);
}
