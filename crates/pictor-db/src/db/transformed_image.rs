use pictor_core::models::{NewTransformedImage, TransformedImage};
use pictor_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Append-only store of transform outputs.
#[async_trait::async_trait]
pub trait TransformedImageRepositoryTrait: Send + Sync {
    async fn create(&self, image: NewTransformedImage) -> Result<TransformedImage, AppError>;

    /// Outputs derived from `image_id`, oldest first. Empty when the parent
    /// image is soft-deleted.
    async fn list_for_image(&self, image_id: Uuid) -> Result<Vec<TransformedImage>, AppError>;
}

/// Repository for the `transformed_images` table
#[derive(Clone)]
pub struct TransformedImageRepository {
    pool: PgPool,
}

impl TransformedImageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl TransformedImageRepositoryTrait for TransformedImageRepository {
    #[tracing::instrument(skip(self, image), fields(db.table = "transformed_images", db.operation = "insert", image_id = %image.image_id))]
    async fn create(&self, image: NewTransformedImage) -> Result<TransformedImage, AppError> {
        let image = sqlx::query_as::<Postgres, TransformedImage>(
            r#"
            INSERT INTO transformed_images (id, url, key, metadata, image_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, url, key, metadata, image_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&image.url)
        .bind(&image.key)
        .bind(&image.metadata)
        .bind(image.image_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(image)
    }

    #[tracing::instrument(skip(self), fields(db.table = "transformed_images", db.operation = "select", image_id = %image_id))]
    async fn list_for_image(&self, image_id: Uuid) -> Result<Vec<TransformedImage>, AppError> {
        let images = sqlx::query_as::<Postgres, TransformedImage>(
            r#"
            SELECT t.id, t.url, t.key, t.metadata, t.image_id, t.created_at
            FROM transformed_images t
            JOIN images i ON i.id = t.image_id
            WHERE t.image_id = $1 AND i.is_deleted = FALSE
            ORDER BY t.created_at ASC, t.id
            "#,
        )
        .bind(image_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }
}
