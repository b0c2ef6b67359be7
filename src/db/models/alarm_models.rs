use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alarm model
///
/// Risk level is one of LOW / MEDIUM / HIGH; `alarm_type` carries the
/// dashboard-facing category label (e.g. "İNSAN_TESPİTİ"). The bounding box
/// is an opaque `[x, y, w, h]` JSON array as reported by the AI service.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    pub id: i32,
    pub camera_id: i32,
    #[serde(rename = "type")]
    pub alarm_type: String,
    pub timestamp: DateTime<Utc>,
    pub confidence: f32,
    pub object_type: Option<String>,
    pub bbox: Option<serde_json::Value>,
    pub risk_level: String,
    pub ai_verified: bool,
}

/// Payload for creating an alarm, either from the API or from a qualifying
/// AI detection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlarm {
    pub camera_id: i32,
    #[serde(rename = "type")]
    pub alarm_type: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub object_type: Option<String>,
    #[serde(default)]
    pub bbox: Option<serde_json::Value>,
    #[serde(default = "default_risk_level")]
    pub risk_level: String,
    #[serde(default)]
    pub ai_verified: bool,
}

fn default_risk_level() -> String {
    "LOW".to_string()
}
