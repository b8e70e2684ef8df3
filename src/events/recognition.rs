//! Events emitted by a speech recognizer

use serde::{Deserialize, Serialize};

/// One ranked hypothesis for an utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub transcript: String,
    pub confidence: f32,
}

/// Recognition output for one utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    /// Interim results are never surfaced, only final ones
    pub is_final: bool,
    /// Best alternative first
    pub alternatives: Vec<Alternative>,
}

impl RecognitionResult {
    /// A final result with a single alternative
    pub fn final_transcript(transcript: impl Into<String>, confidence: f32) -> Self {
        Self {
            is_final: true,
            alternatives: vec![Alternative {
                transcript: transcript.into(),
                confidence,
            }],
        }
    }
}

/// Events delivered by the recognizer while a capture is in progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecognitionEvent {
    /// Recognition produced results
    Result { results: Vec<RecognitionResult> },

    /// Recognition failed with a platform error code
    /// (`no-speech`, `not-allowed`, `network`, ...)
    Error { code: String },

    /// The recognizer's own end-of-session signal
    End,
}

impl RecognitionEvent {
    /// Best final transcript of the first utterance, if any
    pub fn first_final_transcript(&self) -> Option<&str> {
        match self {
            RecognitionEvent::Result { results } => results
                .first()
                .filter(|result| result.is_final)
                .and_then(|result| result.alternatives.first())
                .map(|alt| alt.transcript.as_str()),
            _ => None,
        }
    }
}

impl std::fmt::Display for RecognitionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecognitionEvent::Result { results } => write!(f, "RESULT ({} results)", results.len()),
            RecognitionEvent::Error { code } => write!(f, "ERROR ({code})"),
            RecognitionEvent::End => write!(f, "END"),
        }
    }
}
