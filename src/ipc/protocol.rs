//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian length.

use serde::{Deserialize, Serialize};

use crate::capture::CaptureState;
use crate::error::PipelineError;
use crate::events::Notification;
use crate::pipeline::Snapshot;
use crate::presenter::Screen;
use crate::session::UserProfile;

/// Largest accepted message body
pub const MAX_MESSAGE_LEN: usize = 1024 * 1024;

/// Requests from UI to daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Ping to check connectivity
    Ping,

    /// Request current daemon status
    GetStatus,

    /// Sign in with a profile from the identity provider
    SignIn { profile: UserProfile },

    SignOut,

    /// Microphone button: start or stop capturing
    ToggleListening,

    StopListening,

    /// Final transcript from the client's speech engine
    Utterance {
        transcript: String,
        #[serde(default)]
        confidence: Option<f32>,
    },

    /// Error code reported by the client's speech engine
    RecognitionError { code: String },

    /// The client's speech engine ended the session
    RecognitionEnd,

    /// Request the current rendered screen
    GetView,

    /// Subscribe to notifications and screen updates
    Subscribe,
}

/// Responses from daemon to UI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Pong response to ping
    Pong,

    /// Current daemon status
    Status(DaemonStatus),

    /// Current screen
    View(Screen),

    /// Capture state after a toggle or stop
    Capture { state: CaptureState },

    /// Request accepted
    Ok,

    /// Subscription confirmed
    Subscribed,

    /// Error response
    Error { code: String, message: String },
}

impl From<PipelineError> for Response {
    fn from(err: PipelineError) -> Self {
        Response::Error {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Push message from daemon to UI (for subscribed clients)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Push {
    /// User-visible toast
    Notification(Notification),
    /// The rendered screen changed
    ViewChanged(Screen),
}

/// Full daemon status snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonStatus {
    /// Daemon version
    pub version: String,

    pub authenticated: bool,

    pub user: Option<UserProfile>,

    pub capture: CaptureState,

    /// Whether speech recognition is available at all
    pub speech_supported: bool,

    pub query: String,

    pub loading: bool,

    /// Uptime in seconds
    pub uptime_secs: u64,
}

impl DaemonStatus {
    pub fn from_snapshot(snapshot: Snapshot, uptime_secs: u64) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            authenticated: snapshot.profile.is_some(),
            user: snapshot.profile,
            capture: snapshot.capture,
            speech_supported: snapshot.speech_supported,
            query: snapshot.query,
            loading: snapshot.loading,
            uptime_secs,
        }
    }
}
