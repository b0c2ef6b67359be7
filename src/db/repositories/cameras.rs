use crate::db::models::{Camera, NewCamera};
use crate::error::Error;
use anyhow::Result;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

/// Cameras repository for handling camera operations
#[derive(Clone)]
pub struct CamerasRepository {
    pool: Arc<PgPool>,
}

impl CamerasRepository {
    /// Create a new cameras repository
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Register a new camera
    pub async fn create(&self, camera: &NewCamera) -> Result<Camera> {
        info!("Registering new camera: {}", camera.name);

        let result = sqlx::query_as::<_, Camera>(
            r#"
            INSERT INTO cameras (name, location, ip)
            VALUES ($1, $2, $3)
            RETURNING id, name, location, ip
            "#,
        )
        .bind(&camera.name)
        .bind(&camera.location)
        .bind(&camera.ip)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to create camera: {}", e)))?;

        Ok(result)
    }

    /// Get camera by ID
    pub async fn get_by_id(&self, id: i32) -> Result<Option<Camera>> {
        let result = sqlx::query_as::<_, Camera>(
            r#"
            SELECT id, name, location, ip
            FROM cameras
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get camera by ID: {}", e)))?;

        Ok(result)
    }

    /// Get all cameras
    pub async fn get_all(&self) -> Result<Vec<Camera>> {
        let result = sqlx::query_as::<_, Camera>(
            r#"
            SELECT id, name, location, ip
            FROM cameras
            ORDER BY name
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get all cameras: {}", e)))?;

        Ok(result)
    }

    /// Delete camera
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM cameras
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to delete camera: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }
}
