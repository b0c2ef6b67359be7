use crate::ai::classifier;
use crate::ai::client::{AiClient, Detection};
use crate::config::AiConfig;
use crate::db::models::Alarm;
use crate::db::repositories::AlarmStore;
use crate::error::Error;
use crate::messaging::AlarmNotifier;
use anyhow::Result;
use chrono::Utc;
use log::{error, info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Result of one frame analysis: what the AI saw, and which alarms were
/// created and broadcast as a consequence.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    pub success: bool,
    pub detections: Vec<Detection>,
    pub alarms: Vec<Alarm>,
}

/// Collaborator status as reported by `GET /api/ai/status`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: chrono::DateTime<Utc>,
}

/// Alarm ingestion pipeline: forwards a frame to the inference service with
/// bounded retries, qualifies the detections, persists qualifying alarms and
/// broadcasts each one after its write succeeds.
///
/// All collaborators are injected so tests can run against doubles.
pub struct IngestionPipeline {
    client: Arc<dyn AiClient>,
    alarms: Arc<dyn AlarmStore>,
    notifier: Arc<dyn AlarmNotifier>,
    enabled: bool,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl IngestionPipeline {
    pub fn new(
        client: Arc<dyn AiClient>,
        alarms: Arc<dyn AlarmStore>,
        notifier: Arc<dyn AlarmNotifier>,
        config: &AiConfig,
    ) -> Self {
        Self {
            client,
            alarms,
            notifier,
            enabled: config.enabled,
            retry_attempts: config.retry_attempts.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Analyze one frame for a camera.
    ///
    /// Input validation failures are surfaced immediately and never retried;
    /// only the collaborator call itself is retried. Alarm creation runs
    /// exactly once, after a definitive success.
    pub async fn analyze_frame(&self, image: &[u8], camera_id: i32) -> Result<AnalysisOutcome> {
        if !self.enabled {
            return Err(Error::ServiceUnavailable("AI analysis is disabled".to_string()).into());
        }

        if image.is_empty() {
            return Err(Error::Validation("Image payload is empty".to_string()).into());
        }

        let detections = self.call_with_retry(image, camera_id).await?;
        info!(
            "AI analysis for camera {}: {} detections",
            camera_id,
            detections.len()
        );

        let triggers = classifier::classify(&detections);

        let mut alarms = Vec::with_capacity(triggers.len());
        for trigger in triggers {
            let new_alarm = trigger.into_new_alarm(camera_id);
            let alarm = self.alarms.insert(&new_alarm).await.map_err(|e| {
                error!("Failed to persist alarm for camera {}: {}", camera_id, e);
                e
            })?;

            info!(
                "Alarm created: {} ({:.1}%) camera {}",
                alarm.alarm_type,
                alarm.confidence * 100.0,
                camera_id
            );

            // Broadcast is best-effort and must follow the durable write.
            if let Err(e) = self.notifier.notify_new_alarm(&alarm).await {
                warn!("Failed to broadcast alarm {}: {}", alarm.id, e);
            }

            alarms.push(alarm);
        }

        Ok(AnalysisOutcome {
            success: true,
            detections,
            alarms,
        })
    }

    async fn call_with_retry(&self, image: &[u8], camera_id: i32) -> Result<Vec<Detection>> {
        let mut attempts = 0;

        loop {
            attempts += 1;
            match self.client.analyze_frame(image, camera_id).await {
                Ok(detections) => return Ok(detections),
                Err(err) => {
                    if attempts >= self.retry_attempts {
                        return Err(Error::AiService(format!(
                            "AI analysis failed after {} attempts: {}",
                            attempts, err
                        ))
                        .into());
                    }

                    warn!(
                        "AI analysis attempt {}/{} failed for camera {}: {}",
                        attempts, self.retry_attempts, camera_id, err
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }

    /// Probe the inference service and report whether it is reachable
    pub async fn service_status(&self) -> ServiceStatus {
        if !self.enabled {
            return ServiceStatus {
                status: "disabled",
                ai: None,
                error: None,
                timestamp: Utc::now(),
            };
        }

        match self.client.health().await {
            Ok(body) => ServiceStatus {
                status: "active",
                ai: Some(body),
                error: None,
                timestamp: Utc::now(),
            },
            Err(e) => ServiceStatus {
                status: "inactive",
                ai: None,
                error: Some(e.to_string()),
                timestamp: Utc::now(),
            },
        }
    }
}
