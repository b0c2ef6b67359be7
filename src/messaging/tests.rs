use super::notifier::{AlarmNotifier, WsNotifier};
use crate::db::models::Alarm;
use anyhow::Result;
use chrono::Utc;

fn alarm(id: i32) -> Alarm {
    Alarm {
        id,
        camera_id: 1,
        alarm_type: "İNSAN_TESPİTİ".to_string(),
        timestamp: Utc::now(),
        confidence: 0.85,
        object_type: Some("person".to_string()),
        bbox: None,
        risk_level: "HIGH".to_string(),
        ai_verified: true,
    }
}

#[tokio::test]
async fn subscriber_receives_exactly_one_event() -> Result<()> {
    let notifier = WsNotifier::new(16);
    let mut rx = notifier.subscribe();

    notifier.notify_new_alarm(&alarm(42)).await?;

    let received = rx.recv().await?;
    assert_eq!(received.id, 42);
    assert_eq!(received.alarm_type, "İNSAN_TESPİTİ");

    // Nothing else is pending.
    assert!(rx.try_recv().is_err());
    Ok(())
}

#[tokio::test]
async fn notify_without_subscribers_is_best_effort() -> Result<()> {
    let notifier = WsNotifier::new(16);
    assert_eq!(notifier.subscriber_count(), 0);

    // Must not error just because nobody is connected.
    notifier.notify_new_alarm(&alarm(1)).await?;
    Ok(())
}

#[tokio::test]
async fn every_subscriber_gets_its_own_copy() -> Result<()> {
    let notifier = WsNotifier::new(16);
    let mut first = notifier.subscribe();
    let mut second = notifier.subscribe();
    assert_eq!(notifier.subscriber_count(), 2);

    notifier.notify_new_alarm(&alarm(7)).await?;

    assert_eq!(first.recv().await?.id, 7);
    assert_eq!(second.recv().await?.id, 7);
    Ok(())
}

#[tokio::test]
async fn late_subscribers_see_no_backlog() -> Result<()> {
    let notifier = WsNotifier::new(16);
    notifier.notify_new_alarm(&alarm(1)).await?;

    let mut rx = notifier.subscribe();
    assert!(rx.try_recv().is_err());
    Ok(())
}
