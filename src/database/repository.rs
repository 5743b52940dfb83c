use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::database::models::CourseMode;

/// Errors surfaced by course mode storage backends
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Duplicate(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl StoreError {
    fn not_found(course_id: &str, mode_slug: &str) -> Self {
        StoreError::NotFound(format!(
            "Course mode '{}' not found for course '{}'",
            mode_slug, course_id
        ))
    }

    fn duplicate(course_id: &str, mode_slug: &str) -> Self {
        StoreError::Duplicate(format!(
            "Course mode '{}' already exists for course '{}'",
            mode_slug, course_id
        ))
    }
}

/// Persistence contract for course modes, keyed by (course_id, mode_slug).
///
/// Handlers depend on this trait rather than a concrete backend, so the
/// storage handle is injected through application state and swapped for an
/// in-memory implementation in tests.
#[async_trait]
pub trait CourseModeStore: Send + Sync {
    /// All modes for a course, ordered by slug
    async fn list(&self, course_id: &str) -> Result<Vec<CourseMode>, StoreError>;

    /// Single mode by natural key
    async fn get(&self, course_id: &str, mode_slug: &str) -> Result<Option<CourseMode>, StoreError>;

    /// Insert a new mode; `Duplicate` if the natural key is taken
    async fn create(&self, mode: &CourseMode) -> Result<(), StoreError>;

    /// Replace the stored record matching the mode's natural key
    async fn update(&self, mode: &CourseMode) -> Result<(), StoreError>;

    /// Remove a mode; `NotFound` if the natural key has no record
    async fn delete(&self, course_id: &str, mode_slug: &str) -> Result<(), StoreError>;
}

/// Shared storage handle injected into the router state
pub type CourseModeStoreHandle = Arc<dyn CourseModeStore>;

/// Postgres-backed course mode storage
pub struct PgCourseModeStore {
    pool: PgPool,
}

impl PgCourseModeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CourseModeStore for PgCourseModeStore {
    async fn list(&self, course_id: &str) -> Result<Vec<CourseMode>, StoreError> {
        let modes = sqlx::query_as::<_, CourseMode>(
            r#"
            SELECT course_id, mode_slug, mode_display_name, min_price, currency,
                   expiration_datetime, expiration_datetime_is_explicit,
                   description, sku, bulk_sku
            FROM course_modes
            WHERE course_id = $1
            ORDER BY mode_slug
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(modes)
    }

    async fn get(&self, course_id: &str, mode_slug: &str) -> Result<Option<CourseMode>, StoreError> {
        let mode = sqlx::query_as::<_, CourseMode>(
            r#"
            SELECT course_id, mode_slug, mode_display_name, min_price, currency,
                   expiration_datetime, expiration_datetime_is_explicit,
                   description, sku, bulk_sku
            FROM course_modes
            WHERE course_id = $1 AND mode_slug = $2
            "#,
        )
        .bind(course_id)
        .bind(mode_slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(mode)
    }

    async fn create(&self, mode: &CourseMode) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO course_modes
                (course_id, mode_slug, mode_display_name, min_price, currency,
                 expiration_datetime, expiration_datetime_is_explicit,
                 description, sku, bulk_sku)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(&mode.course_id)
        .bind(&mode.mode_slug)
        .bind(&mode.mode_display_name)
        .bind(mode.min_price)
        .bind(&mode.currency)
        .bind(mode.expiration_datetime)
        .bind(mode.expiration_datetime_is_explicit)
        .bind(&mode.description)
        .bind(&mode.sku)
        .bind(&mode.bulk_sku)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(StoreError::duplicate(&mode.course_id, &mode.mode_slug))
            }
            Err(other) => Err(other.into()),
        }
    }

    async fn update(&self, mode: &CourseMode) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE course_modes
            SET mode_display_name = $3, min_price = $4, currency = $5,
                expiration_datetime = $6, expiration_datetime_is_explicit = $7,
                description = $8, sku = $9, bulk_sku = $10
            WHERE course_id = $1 AND mode_slug = $2
            "#,
        )
        .bind(&mode.course_id)
        .bind(&mode.mode_slug)
        .bind(&mode.mode_display_name)
        .bind(mode.min_price)
        .bind(&mode.currency)
        .bind(mode.expiration_datetime)
        .bind(mode.expiration_datetime_is_explicit)
        .bind(&mode.description)
        .bind(&mode.sku)
        .bind(&mode.bulk_sku)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(&mode.course_id, &mode.mode_slug));
        }
        Ok(())
    }

    async fn delete(&self, course_id: &str, mode_slug: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            "DELETE FROM course_modes WHERE course_id = $1 AND mode_slug = $2",
        )
        .bind(course_id)
        .bind(mode_slug)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(course_id, mode_slug));
        }
        Ok(())
    }
}
