use crate::db::models::Alarm;
use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use tokio::sync::broadcast;

/// Notifier seam for newly persisted alarms. Implementations must only be
/// invoked after the alarm row is durably created.
#[async_trait]
pub trait AlarmNotifier: Send + Sync {
    /// Broadcast a new alarm to every currently connected subscriber
    async fn notify_new_alarm(&self, alarm: &Alarm) -> Result<()>;
}

/// In-process fan-out to connected dashboard WebSocket clients.
///
/// Delivery is best-effort and at-most-once per connected client; there is
/// no backlog or replay for clients that connect later. The broadcast
/// channel is safe under concurrent send/subscribe from independent
/// ingestion tasks.
pub struct WsNotifier {
    tx: broadcast::Sender<Alarm>,
}

impl WsNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe a new client connection to alarm events
    pub fn subscribe(&self) -> broadcast::Receiver<Alarm> {
        self.tx.subscribe()
    }

    /// Number of currently connected subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for WsNotifier {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl AlarmNotifier for WsNotifier {
    async fn notify_new_alarm(&self, alarm: &Alarm) -> Result<()> {
        // A send error only means nobody is connected right now.
        let delivered = self.tx.send(alarm.clone()).unwrap_or(0);
        debug!(
            "Broadcast newAlarm {} to {} subscribers",
            alarm.id, delivered
        );
        Ok(())
    }
}
