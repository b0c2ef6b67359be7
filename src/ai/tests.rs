use super::client::{AiClient, Detection};
use super::pipeline::IngestionPipeline;
use crate::config::AiConfig;
use crate::db::models::{Alarm, NewAlarm};
use crate::db::repositories::AlarmStore;
use crate::error::Error;
use crate::messaging::AlarmNotifier;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// Scripted AI client: fails `failures` times, then returns `detections`.
struct MockAiClient {
    calls: AtomicU32,
    failures: u32,
    detections: Vec<Detection>,
}

impl MockAiClient {
    fn succeeding(detections: Vec<Detection>) -> Self {
        Self {
            calls: AtomicU32::new(0),
            failures: 0,
            detections,
        }
    }

    fn failing_first(failures: u32, detections: Vec<Detection>) -> Self {
        Self {
            calls: AtomicU32::new(0),
            failures,
            detections,
        }
    }

    fn always_failing() -> Self {
        Self {
            calls: AtomicU32::new(0),
            failures: u32::MAX,
            detections: vec![],
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AiClient for MockAiClient {
    async fn analyze_frame(&self, _image: &[u8], _camera_id: i32) -> Result<Vec<Detection>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(Error::AiService("connection refused".to_string()).into());
        }
        Ok(self.detections.clone())
    }

    async fn health(&self) -> Result<serde_json::Value> {
        Ok(serde_json::json!({"status": "active"}))
    }
}

/// In-memory alarm store assigning sequential ids
#[derive(Default)]
struct MemoryAlarmStore {
    alarms: Mutex<Vec<Alarm>>,
}

impl MemoryAlarmStore {
    fn stored(&self) -> Vec<Alarm> {
        self.alarms.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlarmStore for MemoryAlarmStore {
    async fn insert(&self, alarm: &NewAlarm) -> Result<Alarm> {
        let mut alarms = self.alarms.lock().unwrap();
        let stored = Alarm {
            id: alarms.len() as i32 + 1,
            camera_id: alarm.camera_id,
            alarm_type: alarm.alarm_type.clone(),
            timestamp: alarm.timestamp.unwrap_or_else(Utc::now),
            confidence: alarm.confidence,
            object_type: alarm.object_type.clone(),
            bbox: alarm.bbox.clone(),
            risk_level: alarm.risk_level.clone(),
            ai_verified: alarm.ai_verified,
        };
        alarms.push(stored.clone());
        Ok(stored)
    }
}

/// Notifier double collecting every broadcast event
#[derive(Default)]
struct CollectingNotifier {
    events: Mutex<Vec<Alarm>>,
}

impl CollectingNotifier {
    fn received(&self) -> Vec<Alarm> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlarmNotifier for CollectingNotifier {
    async fn notify_new_alarm(&self, alarm: &Alarm) -> Result<()> {
        self.events.lock().unwrap().push(alarm.clone());
        Ok(())
    }
}

fn test_config() -> AiConfig {
    AiConfig {
        retry_attempts: 3,
        retry_delay_ms: 10,
        ..AiConfig::default()
    }
}

fn pipeline_with(
    client: Arc<MockAiClient>,
    store: Arc<MemoryAlarmStore>,
    notifier: Arc<CollectingNotifier>,
    config: &AiConfig,
) -> IngestionPipeline {
    IngestionPipeline::new(client, store, notifier, config)
}

fn person(confidence: f32) -> Detection {
    Detection {
        label: "person".to_string(),
        confidence,
        bbox: Some(vec![1.0, 2.0, 3.0, 4.0]),
    }
}

fn car(confidence: f32) -> Detection {
    Detection {
        label: "car".to_string(),
        confidence,
        bbox: None,
    }
}

#[tokio::test]
async fn qualifying_person_creates_and_broadcasts_one_alarm() -> Result<()> {
    let client = Arc::new(MockAiClient::succeeding(vec![person(0.85)]));
    let store = Arc::new(MemoryAlarmStore::default());
    let notifier = Arc::new(CollectingNotifier::default());
    let pipeline = pipeline_with(client.clone(), store.clone(), notifier.clone(), &test_config());

    let outcome = pipeline.analyze_frame(b"frame", 1).await?;

    assert!(outcome.success);
    assert_eq!(outcome.detections.len(), 1);
    assert_eq!(outcome.alarms.len(), 1);

    let stored = store.stored();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].camera_id, 1);
    assert_eq!(stored[0].alarm_type, "İNSAN_TESPİTİ");
    assert_eq!(stored[0].risk_level, "HIGH");
    assert!(stored[0].ai_verified);

    // Exactly one broadcast, and it matches the persisted record.
    let events = notifier.received();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, stored[0].id);
    assert_eq!(events[0].alarm_type, stored[0].alarm_type);
    Ok(())
}

#[tokio::test]
async fn below_threshold_vehicle_creates_nothing() -> Result<()> {
    let client = Arc::new(MockAiClient::succeeding(vec![car(0.5)]));
    let store = Arc::new(MemoryAlarmStore::default());
    let notifier = Arc::new(CollectingNotifier::default());
    let pipeline = pipeline_with(client, store.clone(), notifier.clone(), &test_config());

    let outcome = pipeline.analyze_frame(b"frame", 2).await?;

    assert!(outcome.success);
    assert_eq!(outcome.detections.len(), 1);
    assert!(outcome.alarms.is_empty());
    assert!(store.stored().is_empty());
    assert!(notifier.received().is_empty());
    Ok(())
}

#[tokio::test]
async fn exhausted_retries_surface_failure_without_alarms() {
    let client = Arc::new(MockAiClient::always_failing());
    let store = Arc::new(MemoryAlarmStore::default());
    let notifier = Arc::new(CollectingNotifier::default());
    let pipeline = pipeline_with(client.clone(), store.clone(), notifier.clone(), &test_config());

    let result = pipeline.analyze_frame(b"frame", 1).await;

    assert!(result.is_err());
    // Exactly the configured number of attempts, no more.
    assert_eq!(client.calls(), 3);
    assert!(store.stored().is_empty());
    assert!(notifier.received().is_empty());

    let message = result.unwrap_err().to_string();
    assert!(message.contains("after 3 attempts"), "got: {}", message);
    assert!(message.contains("connection refused"), "got: {}", message);
}

#[tokio::test]
async fn transient_failures_produce_one_creation_pass() -> Result<()> {
    let client = Arc::new(MockAiClient::failing_first(2, vec![person(0.9)]));
    let store = Arc::new(MemoryAlarmStore::default());
    let notifier = Arc::new(CollectingNotifier::default());
    let pipeline = pipeline_with(client.clone(), store.clone(), notifier.clone(), &test_config());

    let outcome = pipeline.analyze_frame(b"frame", 4).await?;

    // Third attempt succeeded; classification and persistence ran once.
    assert_eq!(client.calls(), 3);
    assert_eq!(outcome.alarms.len(), 1);
    assert_eq!(store.stored().len(), 1);
    assert_eq!(notifier.received().len(), 1);
    Ok(())
}

#[tokio::test]
async fn person_and_vehicle_in_one_frame_raise_two_alarms() -> Result<()> {
    let client = Arc::new(MockAiClient::succeeding(vec![person(0.8), car(0.9)]));
    let store = Arc::new(MemoryAlarmStore::default());
    let notifier = Arc::new(CollectingNotifier::default());
    let pipeline = pipeline_with(client, store.clone(), notifier.clone(), &test_config());

    let outcome = pipeline.analyze_frame(b"frame", 1).await?;

    assert_eq!(outcome.alarms.len(), 2);
    assert_eq!(notifier.received().len(), 2);
    let types: Vec<_> = store.stored().iter().map(|a| a.alarm_type.clone()).collect();
    assert_eq!(types, vec!["İNSAN_TESPİTİ", "ARAÇ_TESPİTİ"]);
    Ok(())
}

#[tokio::test]
async fn empty_image_is_rejected_without_calling_the_service() {
    let client = Arc::new(MockAiClient::succeeding(vec![person(0.9)]));
    let store = Arc::new(MemoryAlarmStore::default());
    let notifier = Arc::new(CollectingNotifier::default());
    let pipeline = pipeline_with(client.clone(), store, notifier, &test_config());

    let result = pipeline.analyze_frame(b"", 1).await;

    assert!(result.is_err());
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn disabled_pipeline_refuses_analysis() {
    let client = Arc::new(MockAiClient::succeeding(vec![person(0.9)]));
    let store = Arc::new(MemoryAlarmStore::default());
    let notifier = Arc::new(CollectingNotifier::default());
    let config = AiConfig {
        enabled: false,
        ..test_config()
    };
    let pipeline = pipeline_with(client.clone(), store, notifier, &config);

    let result = pipeline.analyze_frame(b"frame", 1).await;

    assert!(result.is_err());
    assert_eq!(client.calls(), 0);
}
