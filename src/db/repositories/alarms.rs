use crate::db::models::{Alarm, NewAlarm};
use crate::error::Error;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

const ALARM_COLUMNS: &str =
    "id, camera_id, alarm_type, timestamp, confidence, object_type, bbox, risk_level, ai_verified";

/// Persistence seam for alarm creation. The ingestion pipeline writes
/// through this trait so tests can substitute an in-memory store.
#[async_trait]
pub trait AlarmStore: Send + Sync {
    async fn insert(&self, alarm: &NewAlarm) -> Result<Alarm>;
}

/// Alarms repository for handling alarm operations
#[derive(Clone)]
pub struct AlarmsRepository {
    pool: Arc<PgPool>,
}

impl AlarmsRepository {
    /// Create a new alarms repository
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Create a new alarm
    pub async fn create(&self, alarm: &NewAlarm) -> Result<Alarm> {
        let result = sqlx::query_as::<_, Alarm>(&format!(
            r#"
            INSERT INTO alarms (
                camera_id, alarm_type, timestamp, confidence, object_type, bbox, risk_level, ai_verified
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            ALARM_COLUMNS
        ))
        .bind(alarm.camera_id)
        .bind(&alarm.alarm_type)
        .bind(alarm.timestamp.unwrap_or_else(Utc::now))
        .bind(alarm.confidence)
        .bind(&alarm.object_type)
        .bind(&alarm.bbox)
        .bind(&alarm.risk_level)
        .bind(alarm.ai_verified)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to create alarm: {}", e)))?;

        Ok(result)
    }

    /// Get alarm by ID
    pub async fn get_by_id(&self, id: i32) -> Result<Option<Alarm>> {
        let result = sqlx::query_as::<_, Alarm>(&format!(
            r#"
            SELECT {}
            FROM alarms
            WHERE id = $1
            "#,
            ALARM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get alarm by ID: {}", e)))?;

        Ok(result)
    }

    /// Get all alarms, newest first
    pub async fn get_all(&self, limit: Option<i64>) -> Result<Vec<Alarm>> {
        let limit = limit.unwrap_or(100);

        let result = sqlx::query_as::<_, Alarm>(&format!(
            r#"
            SELECT {}
            FROM alarms
            ORDER BY timestamp DESC
            LIMIT $1
            "#,
            ALARM_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get all alarms: {}", e)))?;

        Ok(result)
    }

    /// Get alarms in a time range, oldest first
    pub async fn get_by_time_range(
        &self,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Vec<Alarm>> {
        let result = sqlx::query_as::<_, Alarm>(&format!(
            r#"
            SELECT {}
            FROM alarms
            WHERE timestamp >= $1 AND timestamp < $2
            ORDER BY timestamp
            "#,
            ALARM_COLUMNS
        ))
        .bind(start_time)
        .bind(end_time)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get alarms in time range: {}", e)))?;

        Ok(result)
    }

    /// Get alarms for a camera since a point in time
    pub async fn get_by_camera_since(
        &self,
        camera_id: i32,
        since: DateTime<Utc>,
    ) -> Result<Vec<Alarm>> {
        let result = sqlx::query_as::<_, Alarm>(&format!(
            r#"
            SELECT {}
            FROM alarms
            WHERE camera_id = $1 AND timestamp >= $2
            ORDER BY timestamp
            "#,
            ALARM_COLUMNS
        ))
        .bind(camera_id)
        .bind(since)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get alarms for camera: {}", e)))?;

        Ok(result)
    }

    /// Delete alarm
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM alarms
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to delete alarm: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AlarmStore for AlarmsRepository {
    async fn insert(&self, alarm: &NewAlarm) -> Result<Alarm> {
        self.create(alarm).await
    }
}
