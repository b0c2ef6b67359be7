use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted report record. `data` holds the shaped statistics payload that
/// was handed to the PDF writer.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: i32,
    pub title: String,
    pub report_type: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub data: serde_json::Value,
    pub is_saved: bool,
    pub created_at: DateTime<Utc>,
}

/// Payload for recording a generated report
#[derive(Debug, Clone)]
pub struct NewReport {
    pub title: String,
    pub report_type: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub data: serde_json::Value,
    pub is_saved: bool,
}
