use crate::ai::client::Detection;
use crate::db::models::NewAlarm;
use chrono::Utc;

/// Minimum confidence for a person detection to raise an alarm.
pub const PERSON_CONFIDENCE_THRESHOLD: f32 = 0.6;
/// Minimum confidence for a vehicle (car/truck) detection to raise an alarm.
pub const VEHICLE_CONFIDENCE_THRESHOLD: f32 = 0.7;
/// Confidence above which a trigger is tagged HIGH risk instead of MEDIUM.
pub const HIGH_RISK_THRESHOLD: f32 = 0.7;

/// Coarse severity tag derived from detection confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

/// A detection that passed the qualification policy and will become an alarm
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmTrigger {
    pub label: String,
    pub alarm_type: &'static str,
    pub confidence: f32,
    pub bbox: Option<Vec<f64>>,
    pub risk_level: RiskLevel,
}

impl AlarmTrigger {
    fn from_detection(detection: &Detection) -> Self {
        Self {
            label: detection.label.clone(),
            alarm_type: alarm_type_for(&detection.label),
            confidence: detection.confidence,
            bbox: detection.bbox.clone(),
            risk_level: risk_level_for(detection.confidence),
        }
    }

    /// Convert the trigger into an alarm creation payload
    pub fn into_new_alarm(self, camera_id: i32) -> NewAlarm {
        NewAlarm {
            camera_id,
            alarm_type: self.alarm_type.to_string(),
            timestamp: Some(Utc::now()),
            confidence: self.confidence,
            object_type: Some(self.label),
            bbox: self.bbox.map(|b| serde_json::json!(b)),
            risk_level: self.risk_level.as_str().to_string(),
            ai_verified: true,
        }
    }
}

/// Map a detection label to its dashboard-facing alarm category
pub fn alarm_type_for(label: &str) -> &'static str {
    match label {
        "person" => "İNSAN_TESPİTİ",
        "car" | "truck" => "ARAÇ_TESPİTİ",
        _ => "NESNE_TESPİTİ",
    }
}

fn risk_level_for(confidence: f32) -> RiskLevel {
    if confidence > HIGH_RISK_THRESHOLD {
        RiskLevel::High
    } else {
        RiskLevel::Medium
    }
}

/// Qualify detections into alarm triggers.
///
/// Pure function over the ordered detection list: the first person above its
/// threshold and, independently, the first car/truck above the vehicle
/// threshold each become one trigger. One frame can therefore yield both a
/// person alarm and a vehicle alarm, but never two of the same category.
pub fn classify(detections: &[Detection]) -> Vec<AlarmTrigger> {
    let mut triggers = Vec::new();

    if let Some(person) = detections
        .iter()
        .find(|d| d.label == "person" && d.confidence > PERSON_CONFIDENCE_THRESHOLD)
    {
        triggers.push(AlarmTrigger::from_detection(person));
    }

    if let Some(vehicle) = detections.iter().find(|d| {
        (d.label == "car" || d.label == "truck") && d.confidence > VEHICLE_CONFIDENCE_THRESHOLD
    }) {
        triggers.push(AlarmTrigger::from_detection(vehicle));
    }

    triggers
}
