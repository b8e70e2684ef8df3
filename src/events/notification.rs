//! User-visible notifications
//!
//! One-way messages with a title, a description and a severity. Callers
//! never wait on or query them.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Visual weight of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Normal,
    Destructive,
}

/// A toast-style message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Notification {
    pub fn normal(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Normal,
        }
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Destructive,
        }
    }

    pub fn capability_unsupported() -> Self {
        Self::destructive(
            "Not Supported",
            "Voice recognition is not supported in this browser. Please try Chrome, Edge, or Safari.",
        )
    }

    pub fn start_failure() -> Self {
        Self::destructive(
            "Failed to Start",
            "Could not start voice recognition. Please try again.",
        )
    }

    pub fn recognition_error(code: &str) -> Self {
        Self::destructive(
            "Recognition Error",
            format!("Error: {code}. Please try again."),
        )
    }

    pub fn signed_in(name: &str) -> Self {
        Self::normal("Signed in successfully", format!("Welcome back, {name}!"))
    }

    pub fn signed_out() -> Self {
        Self::normal(
            "Signed out successfully",
            "You have been signed out of your account.",
        )
    }
}

/// Destination for notifications
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Fans notifications out to every subscribed client
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    pub fn new(tx: broadcast::Sender<Notification>) -> Self {
        Self { tx }
    }
}

impl NotificationSink for BroadcastNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Normal => info!(title = %notification.title, "notification"),
            Severity::Destructive => warn!(
                title = %notification.title,
                description = %notification.description,
                "notification"
            ),
        }
        if self.tx.send(notification).is_err() {
            debug!("no notification subscribers");
        }
    }
}

/// Sink that keeps every notification, for assertions in tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingSink {
    seen: std::sync::Mutex<Vec<Notification>>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.notifications().into_iter().map(|n| n.title).collect()
    }
}

#[cfg(test)]
impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognition_error_carries_code() {
        let n = Notification::recognition_error("not-allowed");
        assert_eq!(n.title, "Recognition Error");
        assert_eq!(n.description, "Error: not-allowed. Please try again.");
        assert_eq!(n.severity, Severity::Destructive);
    }

    #[test]
    fn test_broadcast_reaches_subscribers() {
        let (tx, _) = broadcast::channel(4);
        let mut rx = tx.subscribe();
        let notifier = BroadcastNotifier::new(tx);

        notifier.notify(Notification::signed_in("Ada"));

        let received = rx.try_recv().unwrap();
        assert_eq!(received.description, "Welcome back, Ada!");
        assert_eq!(received.severity, Severity::Normal);
    }

    #[test]
    fn test_broadcast_without_subscribers_is_silent() {
        let (tx, rx) = broadcast::channel(4);
        drop(rx);
        let notifier = BroadcastNotifier::new(tx);
        notifier.notify(Notification::signed_out());
    }
}
