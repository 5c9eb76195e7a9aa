//! In-memory repositories for testing without a database

use chrono::Utc;
use pictor_core::models::{Image, ImageProjection, NewImage, NewTransformedImage, TransformedImage};
use pictor_core::AppError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use super::{ImageRepositoryTrait, TransformedImageRepositoryTrait};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Images kept in insertion order.
#[derive(Clone, Default)]
pub struct InMemoryImageRepository {
    images: Arc<Mutex<Vec<Image>>>,
}

impl InMemoryImageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully-formed record, bypassing `create`.
    pub fn insert(&self, image: Image) {
        lock(&self.images).push(image);
    }

    fn is_active(&self, id: Uuid) -> bool {
        lock(&self.images)
            .iter()
            .any(|image| image.id == id && !image.is_deleted)
    }
}

#[async_trait::async_trait]
impl ImageRepositoryTrait for InMemoryImageRepository {
    async fn create(&self, image: NewImage) -> Result<Image, AppError> {
        let image = Image {
            id: Uuid::new_v4(),
            url: image.url,
            key: image.key,
            metadata: image.metadata,
            user_id: image.user_id,
            is_deleted: false,
            created_at: Utc::now(),
        };
        lock(&self.images).push(image.clone());
        Ok(image)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Image>, AppError> {
        Ok(lock(&self.images).iter().find(|i| i.id == id).cloned())
    }

    async fn find_active(&self, id: Uuid) -> Result<Option<Image>, AppError> {
        Ok(lock(&self.images)
            .iter()
            .find(|i| i.id == id && !i.is_deleted)
            .cloned())
    }

    async fn list_active_by_user(&self, user_id: Uuid) -> Result<Vec<ImageProjection>, AppError> {
        let mut images: Vec<Image> = lock(&self.images)
            .iter()
            .rev()
            .filter(|i| i.user_id == user_id && !i.is_deleted)
            .cloned()
            .collect();
        images.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(images.iter().map(Image::projection).collect())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut images = lock(&self.images);
        match images.iter_mut().find(|i| i.id == id && !i.is_deleted) {
            Some(image) => {
                image.is_deleted = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Transformed images; parent visibility is read from the shared image
/// repository.
#[derive(Clone)]
pub struct InMemoryTransformedImageRepository {
    images: InMemoryImageRepository,
    transformed: Arc<Mutex<Vec<TransformedImage>>>,
}

impl InMemoryTransformedImageRepository {
    pub fn new(images: InMemoryImageRepository) -> Self {
        Self {
            images,
            transformed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every stored row, including those under deleted parents.
    pub fn all(&self) -> Vec<TransformedImage> {
        lock(&self.transformed).clone()
    }
}

#[async_trait::async_trait]
impl TransformedImageRepositoryTrait for InMemoryTransformedImageRepository {
    async fn create(&self, image: NewTransformedImage) -> Result<TransformedImage, AppError> {
        let image = TransformedImage {
            id: Uuid::new_v4(),
            url: image.url,
            key: image.key,
            metadata: image.metadata,
            image_id: image.image_id,
            created_at: Utc::now(),
        };
        lock(&self.transformed).push(image.clone());
        Ok(image)
    }

    async fn list_for_image(&self, image_id: Uuid) -> Result<Vec<TransformedImage>, AppError> {
        if !self.images.is_active(image_id) {
            return Ok(Vec::new());
        }
        Ok(lock(&self.transformed)
            .iter()
            .filter(|t| t.image_id == image_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_image(user_id: Uuid, name: &str) -> NewImage {
        NewImage {
            url: format!("http://localhost/uploads/{}", name),
            key: format!("uploads/{}", name),
            metadata: "{}".to_string(),
            user_id,
        }
    }

    #[tokio::test]
    async fn test_soft_delete_hides_image_but_keeps_row() {
        let repo = InMemoryImageRepository::new();
        let user = Uuid::new_v4();
        let image = repo.create(new_image(user, "a.png")).await.unwrap();

        assert!(repo.soft_delete(image.id).await.unwrap());
        assert!(repo.find_active(image.id).await.unwrap().is_none());

        let row = repo.find_by_id(image.id).await.unwrap().unwrap();
        assert!(row.is_deleted);

        // second delete reports nothing to do
        assert!(!repo.soft_delete(image.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_user_and_live_images() {
        let repo = InMemoryImageRepository::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let first = repo.create(new_image(alice, "1.png")).await.unwrap();
        let second = repo.create(new_image(alice, "2.png")).await.unwrap();
        repo.create(new_image(bob, "3.png")).await.unwrap();
        repo.soft_delete(first.id).await.unwrap();

        let listed = repo.list_active_by_user(alice).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, second.id);
    }

    #[tokio::test]
    async fn test_transformed_images_follow_parent_tombstone() {
        let images = InMemoryImageRepository::new();
        let transformed = InMemoryTransformedImageRepository::new(images.clone());
        let parent = images
            .create(new_image(Uuid::new_v4(), "p.png"))
            .await
            .unwrap();

        transformed
            .create(NewTransformedImage {
                url: "http://localhost/transformed/1_p.png".to_string(),
                key: "transformed/1_p.png".to_string(),
                metadata: "{}".to_string(),
                image_id: parent.id,
            })
            .await
            .unwrap();
        assert_eq!(transformed.list_for_image(parent.id).await.unwrap().len(), 1);

        images.soft_delete(parent.id).await.unwrap();
        assert!(transformed.list_for_image(parent.id).await.unwrap().is_empty());
        assert_eq!(transformed.all().len(), 1);
    }
}
