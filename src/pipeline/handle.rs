//! Cloneable client side of the pipeline actor

use tokio::sync::{mpsc, oneshot};

use crate::capture::CaptureState;
use crate::error::PipelineError;
use crate::presenter::Screen;
use crate::session::UserProfile;

use super::actor::{Command, Snapshot};

/// Sends commands to a running `Pipeline`
#[derive(Debug, Clone)]
pub struct PipelineHandle {
    tx: mpsc::Sender<Command>,
}

impl PipelineHandle {
    pub fn new(tx: mpsc::Sender<Command>) -> Self {
        Self { tx }
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T, PipelineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| PipelineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| PipelineError::ChannelClosed)
    }

    pub async fn sign_in(&self, profile: UserProfile) -> Result<(), PipelineError> {
        self.request(|reply| Command::SignIn { profile, reply }).await?
    }

    pub async fn sign_out(&self) -> Result<(), PipelineError> {
        self.request(|reply| Command::SignOut { reply }).await?
    }

    pub async fn toggle_listening(&self) -> Result<CaptureState, PipelineError> {
        self.request(|reply| Command::ToggleListening { reply }).await?
    }

    pub async fn stop_listening(&self) -> Result<CaptureState, PipelineError> {
        self.request(|reply| Command::StopListening { reply }).await?
    }

    pub async fn snapshot(&self) -> Result<Snapshot, PipelineError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    pub async fn screen(&self) -> Result<Screen, PipelineError> {
        self.request(|reply| Command::Screen { reply }).await
    }

    /// Ask the actor to tear down. Does not wait for it to finish.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown).await;
    }
}
