use serde::{Deserialize, Serialize};

/// Camera model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Camera {
    pub id: i32,
    pub name: String,
    pub location: Option<String>,
    pub ip: Option<String>,
}

/// Payload for registering a camera
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCamera {
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
}
