//! Speech capture module
//!
//! Wraps a speech-recognition capability in a two-state toggle:
//! - Idle: no capture in progress
//! - Listening: the recognizer is running, waiting for one final transcript
//!
//! The capability is injected through `SpeechRecognizer`, so the controller
//! never probes global state and tests can drive it with a fake.

mod controller;
mod recognizer;
mod remote;

pub use controller::{CaptureController, CaptureState};
pub use recognizer::RecognitionOptions;
pub use remote::{RecognizerFeed, RemoteRecognizer};

#[cfg(test)]
pub use recognizer::fake::{FakeCall, FakeRecognizer};
