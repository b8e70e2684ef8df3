//! Speech-recognition capability interface

use serde::{Deserialize, Serialize};

use crate::config::LANGUAGE;

/// Settings applied to every capture attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionOptions {
    /// Keep listening after the first utterance
    pub continuous: bool,
    /// Report partial hypotheses
    pub interim_results: bool,
    pub language: String,
    pub max_alternatives: u32,
}

impl Default for RecognitionOptions {
    fn default() -> Self {
        Self {
            continuous: false,
            interim_results: false,
            language: LANGUAGE.to_string(),
            max_alternatives: 1,
        }
    }
}

/// A platform speech recognizer.
///
/// Implementations deliver `RecognitionEvent`s on the channel they were
/// constructed with: any number of results or one error, then `End`.
/// `abort` must not deliver anything.
pub trait SpeechRecognizer: Send {
    /// Capability probe
    fn is_supported(&self) -> bool;

    /// Begin a capture attempt
    fn start(&mut self, options: &RecognitionOptions) -> Result<(), String>;

    /// Stop listening; pending audio may still produce a result before `End`
    fn stop(&mut self);

    /// Cancel immediately without delivering any further events
    fn abort(&mut self);
}

#[cfg(test)]
pub mod fake {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Calls observed by a `FakeRecognizer`
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum FakeCall {
        Start(RecognitionOptions),
        Stop,
        Abort,
    }

    /// Recognizer that records calls and can be told to fail on start
    #[derive(Debug, Clone)]
    pub struct FakeRecognizer {
        pub supported: bool,
        pub fail_start: Option<String>,
        pub calls: Arc<Mutex<Vec<FakeCall>>>,
    }

    impl FakeRecognizer {
        pub fn supported() -> Self {
            Self {
                supported: true,
                fail_start: None,
                calls: Arc::default(),
            }
        }

        pub fn unsupported() -> Self {
            Self {
                supported: false,
                ..Self::supported()
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                fail_start: Some(message.to_string()),
                ..Self::supported()
            }
        }

        pub fn calls(&self) -> Vec<FakeCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl SpeechRecognizer for FakeRecognizer {
        fn is_supported(&self) -> bool {
            self.supported
        }

        fn start(&mut self, options: &RecognitionOptions) -> Result<(), String> {
            if let Some(message) = &self.fail_start {
                return Err(message.clone());
            }
            self.calls.lock().unwrap().push(FakeCall::Start(options.clone()));
            Ok(())
        }

        fn stop(&mut self) {
            self.calls.lock().unwrap().push(FakeCall::Stop);
        }

        fn abort(&mut self) {
            self.calls.lock().unwrap().push(FakeCall::Abort);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_single_final_utterance() {
        let options = RecognitionOptions::default();
        assert!(!options.continuous);
        assert!(!options.interim_results);
        assert_eq!(options.language, "en-US");
        assert_eq!(options.max_alternatives, 1);
    }
}
