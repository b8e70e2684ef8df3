//! Recognizer fed by a connected front end
//!
//! The daemon has no microphone of its own. The client that owns the
//! speech engine pushes utterances and errors over IPC through a
//! `RecognizerFeed`; this recognizer turns them into `RecognitionEvent`s
//! only while a capture is actually running.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::events::{RecognitionEvent, RecognitionResult};

use super::recognizer::{RecognitionOptions, SpeechRecognizer};

#[derive(Debug, Default)]
struct Shared {
    active: bool,
    /// Bumped on every start/stop/abort so a stale timeout can tell it lost
    generation: u64,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Speech recognizer whose input arrives from a client
pub struct RemoteRecognizer {
    shared: Arc<Mutex<Shared>>,
    events_tx: mpsc::UnboundedSender<RecognitionEvent>,
    supported: bool,
    no_speech_timeout: Duration,
}

/// Handle for pushing client input into a `RemoteRecognizer`
#[derive(Debug, Clone)]
pub struct RecognizerFeed {
    shared: Arc<Mutex<Shared>>,
    events_tx: mpsc::UnboundedSender<RecognitionEvent>,
}

impl RemoteRecognizer {
    pub fn new(
        events_tx: mpsc::UnboundedSender<RecognitionEvent>,
        supported: bool,
        no_speech_timeout: Duration,
    ) -> (Self, RecognizerFeed) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        let feed = RecognizerFeed {
            shared: Arc::clone(&shared),
            events_tx: events_tx.clone(),
        };
        let recognizer = Self {
            shared,
            events_tx,
            supported,
            no_speech_timeout,
        };
        (recognizer, feed)
    }

    fn arm_no_speech_timeout(&self, generation: u64) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no runtime available, no-speech timeout disabled");
            return;
        };

        let shared = Arc::clone(&self.shared);
        let events_tx = self.events_tx.clone();
        let timeout = self.no_speech_timeout;

        runtime.spawn(async move {
            tokio::time::sleep(timeout).await;
            let mut shared = lock(&shared);
            if shared.active && shared.generation == generation {
                debug!(generation, "no speech before timeout");
                shared.active = false;
                let _ = events_tx.send(RecognitionEvent::Error {
                    code: "no-speech".to_string(),
                });
                let _ = events_tx.send(RecognitionEvent::End);
            }
        });
    }
}

impl SpeechRecognizer for RemoteRecognizer {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn start(&mut self, options: &RecognitionOptions) -> Result<(), String> {
        let generation = {
            let mut shared = lock(&self.shared);
            if shared.active {
                return Err("recognition has already started".to_string());
            }
            shared.active = true;
            shared.generation += 1;
            shared.generation
        };

        debug!(generation, language = %options.language, "remote recognizer started");
        self.arm_no_speech_timeout(generation);
        Ok(())
    }

    fn stop(&mut self) {
        let mut shared = lock(&self.shared);
        if shared.active {
            shared.active = false;
            shared.generation += 1;
            let _ = self.events_tx.send(RecognitionEvent::End);
        }
    }

    fn abort(&mut self) {
        let mut shared = lock(&self.shared);
        shared.active = false;
        shared.generation += 1;
    }
}

impl RecognizerFeed {
    /// Deliver a final transcript. Returns false when no capture is running.
    pub fn transcript(&self, transcript: &str, confidence: f32) -> bool {
        self.finish(vec![
            RecognitionEvent::Result {
                results: vec![RecognitionResult::final_transcript(transcript, confidence)],
            },
            RecognitionEvent::End,
        ])
    }

    /// Deliver a platform error code. Returns false when no capture is running.
    pub fn error(&self, code: &str) -> bool {
        self.finish(vec![
            RecognitionEvent::Error {
                code: code.to_string(),
            },
            RecognitionEvent::End,
        ])
    }

    /// End the session without a result
    pub fn end(&self) -> bool {
        self.finish(vec![RecognitionEvent::End])
    }

    fn finish(&self, events: Vec<RecognitionEvent>) -> bool {
        let mut shared = lock(&self.shared);
        if !shared.active {
            debug!("recognizer input ignored, not listening");
            return false;
        }
        shared.active = false;
        shared.generation += 1;
        for event in events {
            if self.events_tx.send(event).is_err() {
                warn!("recognizer event channel closed");
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_recognizer(
        timeout: Duration,
    ) -> (
        RemoteRecognizer,
        RecognizerFeed,
        mpsc::UnboundedReceiver<RecognitionEvent>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (recognizer, feed) = RemoteRecognizer::new(tx, true, timeout);
        (recognizer, feed, rx)
    }

    #[tokio::test]
    async fn test_input_ignored_until_started() {
        let (_recognizer, feed, mut rx) = create_recognizer(Duration::from_secs(60));
        assert!(!feed.transcript("hello", 0.9));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_transcript_then_end() {
        let (mut recognizer, feed, mut rx) = create_recognizer(Duration::from_secs(60));
        recognizer.start(&RecognitionOptions::default()).unwrap();

        assert!(feed.transcript("what time is it", 0.8));

        let first = rx.recv().await.unwrap();
        assert_eq!(first.first_final_transcript(), Some("what time is it"));
        assert_eq!(rx.recv().await.unwrap(), RecognitionEvent::End);

        // Session is over; further input is dropped
        assert!(!feed.transcript("again", 0.8));
    }

    #[tokio::test]
    async fn test_double_start_fails_like_platform() {
        let (mut recognizer, _feed, _rx) = create_recognizer(Duration::from_secs(60));
        recognizer.start(&RecognitionOptions::default()).unwrap();
        assert!(recognizer.start(&RecognitionOptions::default()).is_err());
    }

    #[tokio::test]
    async fn test_stop_emits_end_and_abort_is_silent() {
        let (mut recognizer, _feed, mut rx) = create_recognizer(Duration::from_secs(60));

        recognizer.start(&RecognitionOptions::default()).unwrap();
        recognizer.stop();
        assert_eq!(rx.recv().await.unwrap(), RecognitionEvent::End);

        recognizer.start(&RecognitionOptions::default()).unwrap();
        recognizer.abort();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_no_speech_timeout() {
        let (mut recognizer, _feed, mut rx) = create_recognizer(Duration::from_millis(10));
        recognizer.start(&RecognitionOptions::default()).unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            RecognitionEvent::Error {
                code: "no-speech".to_string()
            }
        );
        assert_eq!(rx.recv().await.unwrap(), RecognitionEvent::End);
    }

    #[tokio::test]
    async fn test_timeout_from_earlier_capture_is_ignored() {
        let (mut recognizer, feed, mut rx) = create_recognizer(Duration::from_millis(20));
        recognizer.start(&RecognitionOptions::default()).unwrap();
        assert!(feed.end());
        assert_eq!(rx.recv().await.unwrap(), RecognitionEvent::End);

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(rx.try_recv().is_err());
    }
}
