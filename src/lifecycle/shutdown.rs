//! Signal handling for graceful shutdown

use std::fmt;

use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, warn};

/// Why the daemon is stopping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    Terminate,
    Interrupt,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::Terminate => write!(f, "SIGTERM"),
            ShutdownReason::Interrupt => write!(f, "SIGINT"),
        }
    }
}

/// Handles shutdown signals (SIGTERM, SIGINT)
#[derive(Debug, Default)]
pub struct ShutdownSignal;

impl ShutdownSignal {
    pub fn new() -> Self {
        Self
    }

    /// Wait for a shutdown signal.
    ///
    /// If SIGTERM cannot be registered, only Ctrl-C is honoured.
    pub async fn wait(&self) -> ShutdownReason {
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                warn!(?e, "failed to register SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                return ShutdownReason::Interrupt;
            }
        };

        let reason = tokio::select! {
            _ = sigterm.recv() => ShutdownReason::Terminate,
            _ = tokio::signal::ctrl_c() => ShutdownReason::Interrupt,
        };
        debug!(%reason, "received shutdown signal");
        reason
    }
}
