use crate::db::models::{NewReport, Report};
use crate::error::Error;
use anyhow::Result;
use sqlx::PgPool;
use std::sync::Arc;

const REPORT_COLUMNS: &str =
    "id, title, report_type, period_start, period_end, data, is_saved, created_at";

/// Reports repository for persisted report records
#[derive(Clone)]
pub struct ReportsRepository {
    pool: Arc<PgPool>,
}

impl ReportsRepository {
    /// Create a new reports repository
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Record a generated report
    pub async fn create(&self, report: &NewReport) -> Result<Report> {
        let result = sqlx::query_as::<_, Report>(&format!(
            r#"
            INSERT INTO reports (title, report_type, period_start, period_end, data, is_saved)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            REPORT_COLUMNS
        ))
        .bind(&report.title)
        .bind(&report.report_type)
        .bind(report.period_start)
        .bind(report.period_end)
        .bind(&report.data)
        .bind(report.is_saved)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to create report: {}", e)))?;

        Ok(result)
    }

    /// Get report by ID
    pub async fn get_by_id(&self, id: i32) -> Result<Option<Report>> {
        let result = sqlx::query_as::<_, Report>(&format!(
            r#"
            SELECT {}
            FROM reports
            WHERE id = $1
            "#,
            REPORT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get report by ID: {}", e)))?;

        Ok(result)
    }

    /// Get all report records, newest first
    pub async fn get_all(&self) -> Result<Vec<Report>> {
        let result = sqlx::query_as::<_, Report>(&format!(
            r#"
            SELECT {}
            FROM reports
            ORDER BY created_at DESC
            "#,
            REPORT_COLUMNS
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get all reports: {}", e)))?;

        Ok(result)
    }

    /// Delete report record
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM reports
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to delete report: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }
}
