//! Events module for the capture-to-result pipeline
//!
//! Provides the event types a speech recognizer emits during a capture
//! attempt, and the fire-and-forget notifications shown to the user.

mod notification;
mod recognition;

pub use notification::{BroadcastNotifier, Notification, NotificationSink};
pub use recognition::{RecognitionEvent, RecognitionResult};

#[cfg(test)]
pub use notification::{RecordingSink, Severity};
