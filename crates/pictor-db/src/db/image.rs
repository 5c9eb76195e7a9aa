use pictor_core::models::{Image, ImageProjection, NewImage};
use pictor_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const IMAGE_COLUMNS: &str = "id, url, key, metadata, user_id, is_deleted, created_at";

/// Source image records.
///
/// Rows are never physically removed; `soft_delete` flips the tombstone and
/// every `*_active` query filters on it.
#[async_trait::async_trait]
pub trait ImageRepositoryTrait: Send + Sync {
    async fn create(&self, image: NewImage) -> Result<Image, AppError>;

    /// Fetch by id regardless of the tombstone.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Image>, AppError>;

    /// Fetch by id, treating soft-deleted rows as missing.
    async fn find_active(&self, id: Uuid) -> Result<Option<Image>, AppError>;

    /// The user's live images, newest first.
    async fn list_active_by_user(&self, user_id: Uuid) -> Result<Vec<ImageProjection>, AppError>;

    /// Mark an image deleted. Returns `false` when it was missing or
    /// already deleted.
    async fn soft_delete(&self, id: Uuid) -> Result<bool, AppError>;
}

/// Repository for the `images` table
#[derive(Clone)]
pub struct ImageRepository {
    pool: PgPool,
}

impl ImageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ImageRepositoryTrait for ImageRepository {
    #[tracing::instrument(skip(self, image), fields(db.table = "images", db.operation = "insert", user_id = %image.user_id))]
    async fn create(&self, image: NewImage) -> Result<Image, AppError> {
        let image = sqlx::query_as::<Postgres, Image>(&format!(
            r#"
            INSERT INTO images (id, url, key, metadata, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            IMAGE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&image.url)
        .bind(&image.key)
        .bind(&image.metadata)
        .bind(image.user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(image)
    }

    #[tracing::instrument(skip(self), fields(db.table = "images", db.operation = "select", db.record_id = %id))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Image>, AppError> {
        let image = sqlx::query_as::<Postgres, Image>(&format!(
            "SELECT {} FROM images WHERE id = $1",
            IMAGE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(image)
    }

    #[tracing::instrument(skip(self), fields(db.table = "images", db.operation = "select", db.record_id = %id))]
    async fn find_active(&self, id: Uuid) -> Result<Option<Image>, AppError> {
        let image = sqlx::query_as::<Postgres, Image>(&format!(
            "SELECT {} FROM images WHERE id = $1 AND is_deleted = FALSE",
            IMAGE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(image)
    }

    #[tracing::instrument(skip(self), fields(db.table = "images", db.operation = "select"))]
    async fn list_active_by_user(&self, user_id: Uuid) -> Result<Vec<ImageProjection>, AppError> {
        let images = sqlx::query_as::<Postgres, ImageProjection>(
            r#"
            SELECT id, url, created_at
            FROM images
            WHERE user_id = $1 AND is_deleted = FALSE
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }

    #[tracing::instrument(skip(self), fields(db.table = "images", db.operation = "update", db.record_id = %id))]
    async fn soft_delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE images SET is_deleted = TRUE WHERE id = $1 AND is_deleted = FALSE")
                .bind(id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
