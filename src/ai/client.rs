use crate::config::AiConfig;
use crate::error::Error;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::multipart;
use serde::{Deserialize, Serialize};

/// A single object-recognition result from the inference service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    #[serde(default)]
    pub confidence: f32,
    /// `[x, y, w, h]` in frame coordinates
    #[serde(default)]
    pub bbox: Option<Vec<f64>>,
}

/// Wire response of `POST /api/analyze-frame`
#[derive(Debug, Deserialize)]
struct AnalyzeFrameResponse {
    success: bool,
    #[serde(default)]
    detections: Vec<Detection>,
    #[serde(default)]
    error: Option<String>,
}

/// Client seam for the external inference service
#[async_trait]
pub trait AiClient: Send + Sync {
    /// Submit one frame for analysis and return its detections
    async fn analyze_frame(&self, image: &[u8], camera_id: i32) -> Result<Vec<Detection>>;

    /// Probe the service's health endpoint
    async fn health(&self) -> Result<serde_json::Value>;
}

/// HTTP client for the inference service. Frames go out as binary multipart
/// (an `image` file part plus a `cameraId` field); the per-call timeout is
/// set at construction because hosted inference can be slow.
pub struct HttpAiClient {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
    health_client: reqwest::Client,
}

impl HttpAiClient {
    pub fn new(config: &AiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        let health_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.health_timeout_secs))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            client,
            health_client,
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }
}

#[async_trait]
impl AiClient for HttpAiClient {
    async fn analyze_frame(&self, image: &[u8], camera_id: i32) -> Result<Vec<Detection>> {
        let form = multipart::Form::new()
            .part(
                "image",
                multipart::Part::bytes(image.to_vec())
                    .file_name("frame.jpg")
                    .mime_str("image/jpeg")
                    .map_err(|e| Error::AiService(format!("Invalid frame payload: {}", e)))?,
            )
            .text("cameraId", camera_id.to_string());

        let request = self
            .client
            .post(format!("{}/api/analyze-frame", self.base_url))
            .multipart(form);

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| Error::AiService(format!("AI service unreachable: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::AiService(format!(
                "AI service returned {}: {}",
                status, body
            ))
            .into());
        }

        let analysis: AnalyzeFrameResponse = response
            .json()
            .await
            .map_err(|e| Error::AiService(format!("Invalid AI service response: {}", e)))?;

        if !analysis.success {
            let message = analysis
                .error
                .unwrap_or_else(|| "analysis failed".to_string());
            return Err(Error::AiService(message).into());
        }

        Ok(analysis.detections)
    }

    async fn health(&self) -> Result<serde_json::Value> {
        let request = self
            .health_client
            .get(format!("{}/api/health", self.base_url));

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| Error::AiService(format!("AI service unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::AiService(format!(
                "AI health probe returned {}",
                response.status()
            ))
            .into());
        }

        let body = response
            .json()
            .await
            .map_err(|e| Error::AiService(format!("Invalid AI health response: {}", e)))?;

        Ok(body)
    }
}
