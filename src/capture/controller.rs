//! Capture controller state machine
//!
//! Handles transitions between Idle and Listening based on explicit
//! start/stop calls and the recognizer's terminal events.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::CaptureError;
use crate::events::{Notification, NotificationSink, RecognitionEvent};

use super::recognizer::{RecognitionOptions, SpeechRecognizer};

/// The two states of a capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureState {
    #[default]
    Idle,
    Listening,
}

impl std::fmt::Display for CaptureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureState::Idle => write!(f, "Idle"),
            CaptureState::Listening => write!(f, "Listening"),
        }
    }
}

/// Owns the recognizer and the capture state
pub struct CaptureController {
    recognizer: Box<dyn SpeechRecognizer>,
    /// Capability probe result, decided once at construction
    supported: bool,
    state: CaptureState,
    options: RecognitionOptions,
    notifier: Arc<dyn NotificationSink>,
    /// The capability-missing notification is shown once per controller
    unsupported_reported: bool,
    /// Time when Listening was entered
    listening_since: Option<Instant>,
    torn_down: bool,
}

impl CaptureController {
    pub fn new(
        recognizer: Box<dyn SpeechRecognizer>,
        options: RecognitionOptions,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let supported = recognizer.is_supported();
        if !supported {
            warn!("speech recognition capability not available");
        }

        Self {
            recognizer,
            supported,
            state: CaptureState::Idle,
            options,
            notifier,
            unsupported_reported: false,
            listening_since: None,
            torn_down: false,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state == CaptureState::Listening
    }

    pub fn is_supported(&self) -> bool {
        self.supported
    }

    /// Begin a capture attempt.
    ///
    /// Callers check `is_listening` first; starting twice is rejected
    /// without touching the recognizer.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.torn_down {
            debug!("start requested after teardown");
            return Err(CaptureError::TornDown);
        }

        if !self.supported {
            if !self.unsupported_reported {
                self.unsupported_reported = true;
                self.notifier.notify(Notification::capability_unsupported());
            }
            return Err(CaptureError::CapabilityUnsupported);
        }

        if self.is_listening() {
            warn!("start requested while already listening");
            return Err(CaptureError::AlreadyListening);
        }

        if let Err(message) = self.recognizer.start(&self.options) {
            warn!(%message, "error starting speech recognition");
            self.notifier.notify(Notification::start_failure());
            return Err(CaptureError::StartFailure(message));
        }

        self.transition_to(CaptureState::Listening, "start");
        Ok(())
    }

    /// User-initiated stop
    pub fn stop(&mut self) {
        if self.is_listening() {
            self.recognizer.stop();
        }
        self.transition_to(CaptureState::Idle, "user_stop");
    }

    /// Stop when listening, start otherwise. Returns the resulting state.
    pub fn toggle(&mut self) -> Result<CaptureState, CaptureError> {
        if self.is_listening() {
            self.stop();
        } else {
            self.start()?;
        }
        Ok(self.state)
    }

    /// Feed one recognizer event through the state machine.
    ///
    /// Returns the transcript when the event carries a final result.
    pub fn handle_event(&mut self, event: RecognitionEvent) -> Option<String> {
        if self.torn_down {
            debug!(%event, "ignoring recognizer event after teardown");
            return None;
        }

        match event {
            RecognitionEvent::Result { .. } => {
                let transcript = event.first_final_transcript().map(str::to_owned);
                match &transcript {
                    Some(text) => {
                        debug!(transcript = %text, "final transcript");
                        self.transition_to(CaptureState::Idle, "final_result");
                    }
                    None => debug!("ignoring non-final recognition result"),
                }
                transcript
            }
            RecognitionEvent::Error { code } => {
                warn!(%code, "speech recognition error");
                self.notifier.notify(Notification::recognition_error(&code));
                self.transition_to(CaptureState::Idle, "recognition_error");
                None
            }
            RecognitionEvent::End => {
                self.transition_to(CaptureState::Idle, "recognizer_end");
                None
            }
        }
    }

    /// Abort any in-flight capture without reporting anything.
    /// Later recognizer events are ignored.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        if self.supported {
            self.recognizer.abort();
        }
        self.state = CaptureState::Idle;
        self.listening_since = None;
        info!("capture controller torn down");
    }

    fn transition_to(&mut self, new_state: CaptureState, cause: &'static str) {
        let old_state = self.state;
        if old_state == new_state {
            return;
        }

        let duration_ms = self
            .listening_since
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0);

        info!(
            from = %old_state,
            to = %new_state,
            cause,
            duration_ms,
            "capture transition"
        );

        self.state = new_state;
        self.listening_since = match new_state {
            CaptureState::Listening => Some(Instant::now()),
            CaptureState::Idle => None,
        };
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{FakeCall, FakeRecognizer};
    use crate::events::{RecognitionResult, RecordingSink, Severity};

    fn create_controller(recognizer: FakeRecognizer) -> (CaptureController, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let controller = CaptureController::new(
            Box::new(recognizer),
            RecognitionOptions::default(),
            sink.clone(),
        );
        (controller, sink)
    }

    fn final_result(text: &str) -> RecognitionEvent {
        RecognitionEvent::Result {
            results: vec![RecognitionResult::final_transcript(text, 0.9)],
        }
    }

    #[test]
    fn test_initial_state() {
        let (controller, sink) = create_controller(FakeRecognizer::supported());
        assert_eq!(controller.state(), CaptureState::Idle);
        assert!(sink.notifications().is_empty());
    }

    #[test]
    fn test_start_enters_listening_with_options() {
        let recognizer = FakeRecognizer::supported();
        let (mut controller, _) = create_controller(recognizer.clone());

        controller.start().unwrap();

        assert!(controller.is_listening());
        assert_eq!(
            recognizer.calls(),
            vec![FakeCall::Start(RecognitionOptions::default())]
        );
    }

    #[test]
    fn test_unsupported_start_stays_idle_and_notifies_once() {
        let (mut controller, sink) = create_controller(FakeRecognizer::unsupported());

        assert_eq!(controller.start(), Err(CaptureError::CapabilityUnsupported));
        assert_eq!(controller.state(), CaptureState::Idle);
        assert_eq!(sink.titles(), vec!["Not Supported"]);

        assert_eq!(controller.start(), Err(CaptureError::CapabilityUnsupported));
        assert_eq!(sink.notifications().len(), 1);
    }

    #[test]
    fn test_failed_start_leaves_state_idle() {
        let (mut controller, sink) = create_controller(FakeRecognizer::failing("InvalidStateError"));

        let err = controller.start().unwrap_err();
        assert_eq!(err, CaptureError::StartFailure("InvalidStateError".to_string()));
        assert_eq!(controller.state(), CaptureState::Idle);
        assert_eq!(sink.titles(), vec!["Failed to Start"]);
    }

    #[test]
    fn test_start_while_listening_is_rejected() {
        let recognizer = FakeRecognizer::supported();
        let (mut controller, _) = create_controller(recognizer.clone());
        controller.start().unwrap();

        assert_eq!(controller.start(), Err(CaptureError::AlreadyListening));
        assert!(controller.is_listening());
        assert_eq!(recognizer.calls().len(), 1);
    }

    #[test]
    fn test_final_result_yields_transcript_and_idles() {
        let (mut controller, _) = create_controller(FakeRecognizer::supported());
        controller.start().unwrap();

        let transcript = controller.handle_event(final_result("weather in paris"));

        assert_eq!(transcript.as_deref(), Some("weather in paris"));
        assert_eq!(controller.state(), CaptureState::Idle);
    }

    #[test]
    fn test_interim_result_keeps_listening() {
        let (mut controller, _) = create_controller(FakeRecognizer::supported());
        controller.start().unwrap();

        let interim = RecognitionEvent::Result {
            results: vec![RecognitionResult {
                is_final: false,
                alternatives: vec![],
            }],
        };
        assert_eq!(controller.handle_event(interim), None);
        assert!(controller.is_listening());
    }

    #[test]
    fn test_any_error_code_returns_to_idle() {
        for code in ["no-speech", "not-allowed", "network", "audio-capture", "aborted"] {
            let (mut controller, sink) = create_controller(FakeRecognizer::supported());
            controller.start().unwrap();

            let transcript = controller.handle_event(RecognitionEvent::Error {
                code: code.to_string(),
            });

            assert_eq!(transcript, None);
            assert_eq!(controller.state(), CaptureState::Idle, "code {code}");
            let seen = sink.notifications();
            assert_eq!(seen.len(), 1);
            assert_eq!(seen[0].severity, Severity::Destructive);
            assert!(seen[0].description.contains(code));
        }
    }

    #[test]
    fn test_recognizer_end_is_backstop() {
        let (mut controller, sink) = create_controller(FakeRecognizer::supported());
        controller.start().unwrap();

        controller.handle_event(RecognitionEvent::End);

        assert_eq!(controller.state(), CaptureState::Idle);
        assert!(sink.notifications().is_empty());
    }

    #[test]
    fn test_toggle_stops_listening() {
        let recognizer = FakeRecognizer::supported();
        let (mut controller, _) = create_controller(recognizer.clone());

        assert_eq!(controller.toggle().unwrap(), CaptureState::Listening);
        assert_eq!(controller.toggle().unwrap(), CaptureState::Idle);
        assert_eq!(recognizer.calls().last(), Some(&FakeCall::Stop));
    }

    #[test]
    fn test_teardown_aborts_silently() {
        let recognizer = FakeRecognizer::supported();
        let (mut controller, sink) = create_controller(recognizer.clone());
        controller.start().unwrap();

        controller.teardown();

        assert_eq!(controller.state(), CaptureState::Idle);
        assert_eq!(recognizer.calls().last(), Some(&FakeCall::Abort));
        assert_eq!(controller.handle_event(final_result("late")), None);
        assert_eq!(
            controller.handle_event(RecognitionEvent::Error {
                code: "aborted".to_string()
            }),
            None
        );
        assert!(sink.notifications().is_empty());
    }

    #[test]
    fn test_start_refused_after_teardown() {
        let recognizer = FakeRecognizer::supported();
        let (mut controller, sink) = create_controller(recognizer.clone());
        controller.teardown();

        assert_eq!(controller.start(), Err(CaptureError::TornDown));
        assert_eq!(controller.toggle(), Err(CaptureError::TornDown));
        assert_eq!(controller.state(), CaptureState::Idle);
        assert!(!recognizer
            .calls()
            .iter()
            .any(|call| matches!(call, FakeCall::Start(_))));
        assert!(sink.notifications().is_empty());
    }

    #[test]
    fn test_drop_aborts_recognizer() {
        let recognizer = FakeRecognizer::supported();
        {
            let (mut controller, _) = create_controller(recognizer.clone());
            controller.start().unwrap();
        }
        let aborts = recognizer
            .calls()
            .into_iter()
            .filter(|call| *call == FakeCall::Abort)
            .count();
        assert_eq!(aborts, 1);
    }
}
