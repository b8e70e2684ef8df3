//! Error taxonomy for the voice search pipeline
//!
//! None of these are fatal. Each one is recovered where it occurs and
//! surfaced as a notification, a substitute result, or a log line.

use std::path::PathBuf;

use thiserror::Error;

/// Failures of the Capture Controller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("speech recognition is not supported on this platform")]
    CapabilityUnsupported,

    #[error("a capture is already in progress")]
    AlreadyListening,

    #[error("failed to start speech recognition: {0}")]
    StartFailure(String),

    #[error("capture controller has been torn down")]
    TornDown,
}

/// Durable profile storage failures
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("stored profile is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Errors returned by pipeline operations
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("sign in required")]
    NotAuthenticated,

    #[error("query processing failed: {0}")]
    QueryProcessing(String),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("pipeline is no longer running")]
    ChannelClosed,
}

impl PipelineError {
    /// Stable machine-readable code for IPC error responses
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::NotAuthenticated => "not_authenticated",
            PipelineError::QueryProcessing(_) => "query_processing",
            PipelineError::Capture(CaptureError::CapabilityUnsupported) => "capability_unsupported",
            PipelineError::Capture(CaptureError::AlreadyListening) => "already_listening",
            PipelineError::Capture(CaptureError::StartFailure(_)) => "start_failure",
            PipelineError::Capture(CaptureError::TornDown) => "unavailable",
            PipelineError::Storage(_) => "storage",
            PipelineError::ChannelClosed => "unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(PipelineError::NotAuthenticated.code(), "not_authenticated");
        let err: PipelineError = CaptureError::CapabilityUnsupported.into();
        assert_eq!(err.code(), "capability_unsupported");
        assert_eq!(
            err.to_string(),
            "speech recognition is not supported on this platform"
        );
    }

    #[test]
    fn test_corrupt_storage_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: StorageError = json_err.into();
        assert!(err.to_string().starts_with("stored profile is corrupt"));
    }
}
