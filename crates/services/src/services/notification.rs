//! Notification fan-out: OS-level notifications plus an in-process stream
//! for in-app consumers.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ContractExpiry,
    PaymentDue,
}

/// Alert derived during a poll cycle. Ephemeral: broadcast, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationEvent {
    pub kind: NotificationKind,
    pub subject_id: Uuid,
    pub title: String,
    pub body: String,
    pub urgent: bool,
}

#[derive(Clone)]
pub struct NotificationService {
    sender: broadcast::Sender<NotificationEvent>,
    os_notifications: bool,
}

impl NotificationService {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self {
            sender,
            os_notifications: true,
        }
    }

    /// In-app stream only; used by tests and headless deployments.
    pub fn without_os_notifications() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self {
            sender,
            os_notifications: false,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.sender.subscribe()
    }

    pub async fn notify(&self, event: NotificationEvent) {
        // Nobody listening is fine; the send result only reports that.
        let _ = self.sender.send(event.clone());

        if self.os_notifications {
            self.show_os_notification(&event);
        }
    }

    fn show_os_notification(&self, event: &NotificationEvent) {
        let timeout = if event.urgent { 0 } else { 10_000 };
        let result = notify_rust::Notification::new()
            .appname("locmaq")
            .summary(&event.title)
            .body(&event.body)
            .timeout(notify_rust::Timeout::Milliseconds(timeout))
            .show();

        match result {
            Ok(_) => debug!(subject_id = %event.subject_id, "os notification shown"),
            // Denied permission or no notification daemon: degrade silently.
            Err(e) => warn!("failed to show os notification: {e}"),
        }
    }
}

impl Default for NotificationService {
    fn default() -> Self {
        Self::new()
    }
}
