//! Pipeline actor implementation

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::capture::{CaptureController, CaptureState};
use crate::error::PipelineError;
use crate::events::RecognitionEvent;
use crate::presenter::Screen;
use crate::search::{error_result, ResultRecord, SearchService};
use crate::session::{SessionStore, UserProfile};

use super::query::QuerySession;

/// Requests handled by the pipeline actor
#[derive(Debug)]
pub enum Command {
    SignIn {
        profile: UserProfile,
        reply: oneshot::Sender<Result<(), PipelineError>>,
    },
    SignOut {
        reply: oneshot::Sender<Result<(), PipelineError>>,
    },
    ToggleListening {
        reply: oneshot::Sender<Result<CaptureState, PipelineError>>,
    },
    StopListening {
        reply: oneshot::Sender<Result<CaptureState, PipelineError>>,
    },
    Snapshot {
        reply: oneshot::Sender<Snapshot>,
    },
    Screen {
        reply: oneshot::Sender<Screen>,
    },
    /// Tear down and exit the run loop
    Shutdown,
}

/// Point-in-time view of the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub profile: Option<UserProfile>,
    pub capture: CaptureState,
    pub speech_supported: bool,
    pub query: String,
    pub loading: bool,
    pub result_count: usize,
}

/// A search task's answer, tagged with the query it belongs to
#[derive(Debug)]
pub(super) struct SearchCompletion {
    token: u64,
    outcome: Result<Vec<ResultRecord>, PipelineError>,
}

/// Owns the session store, the capture controller and the query session
pub struct Pipeline {
    session: SessionStore,
    capture: CaptureController,
    search: SearchService,
    query: QuerySession,
    /// Drop results whose token is no longer the latest
    discard_stale: bool,
    /// Pushes every new screen to subscribed clients
    screen_tx: broadcast::Sender<Screen>,
}

impl Pipeline {
    pub fn new(
        session: SessionStore,
        capture: CaptureController,
        search: SearchService,
        discard_stale: bool,
        screen_tx: broadcast::Sender<Screen>,
    ) -> Self {
        Self {
            session,
            capture,
            search,
            query: QuerySession::default(),
            discard_stale,
            screen_tx,
        }
    }

    /// Run the actor until a shutdown command arrives or every handle is gone
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut recognition_rx: mpsc::UnboundedReceiver<RecognitionEvent>,
    ) {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<SearchCompletion>();

        info!(
            authenticated = self.session.is_authenticated(),
            speech_supported = self.capture.is_supported(),
            "pipeline started"
        );

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(event) = recognition_rx.recv() => {
                    self.handle_recognition(event, &done_tx);
                }
                Some(completion) = done_rx.recv() => {
                    self.apply_completion(completion);
                }
            }
        }

        self.capture.teardown();
        info!("pipeline stopped");
    }

    fn handle_command(&mut self, command: Command) {
        debug!(?command, "pipeline command");
        match command {
            Command::SignIn { profile, reply } => {
                let _ = reply.send(self.sign_in(profile));
            }
            Command::SignOut { reply } => {
                let _ = reply.send(self.sign_out());
            }
            Command::ToggleListening { reply } => {
                let _ = reply.send(self.toggle_listening());
            }
            Command::StopListening { reply } => {
                let _ = reply.send(self.stop_listening());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            Command::Screen { reply } => {
                let _ = reply.send(self.query.screen());
            }
            Command::Shutdown => {}
        }
    }

    fn sign_in(&mut self, profile: UserProfile) -> Result<(), PipelineError> {
        self.session.sign_in(profile)?;
        Ok(())
    }

    /// Sign out, stopping any capture and clearing the query session
    fn sign_out(&mut self) -> Result<(), PipelineError> {
        self.session.sign_out()?;
        if self.capture.is_listening() {
            self.capture.stop();
        }
        self.query.reset();
        self.publish_screen();
        Ok(())
    }

    fn toggle_listening(&mut self) -> Result<CaptureState, PipelineError> {
        self.require_session()?;
        Ok(self.capture.toggle()?)
    }

    fn stop_listening(&mut self) -> Result<CaptureState, PipelineError> {
        self.require_session()?;
        self.capture.stop();
        Ok(self.capture.state())
    }

    fn require_session(&self) -> Result<(), PipelineError> {
        if self.session.is_authenticated() {
            Ok(())
        } else {
            Err(PipelineError::NotAuthenticated)
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            profile: self.session.current_profile().cloned(),
            capture: self.capture.state(),
            speech_supported: self.capture.is_supported(),
            query: self.query.query().to_string(),
            loading: self.query.is_loading(),
            result_count: self.query.results().len(),
        }
    }

    fn handle_recognition(
        &mut self,
        event: RecognitionEvent,
        done_tx: &mpsc::UnboundedSender<SearchCompletion>,
    ) {
        if let Some(transcript) = self.capture.handle_event(event) {
            self.begin_query(&transcript, done_tx);
        }
    }

    /// Start a query for `transcript` and spawn its search
    fn begin_query(&mut self, transcript: &str, done_tx: &mpsc::UnboundedSender<SearchCompletion>) {
        if !self.session.is_authenticated() {
            warn!("dropping transcript, no signed-in user");
            return;
        }

        let token = self.query.begin(transcript);
        info!(token, query = transcript, "query started");
        self.publish_screen();

        let service = self.search.clone();
        let query = transcript.to_string();
        let done_tx = done_tx.clone();

        tokio::spawn(async move {
            let search = tokio::spawn(async move { service.search(&query).await });
            let outcome = search
                .await
                .map_err(|e| PipelineError::QueryProcessing(e.to_string()));
            if let Err(e) = &outcome {
                error!(token, %e, "search error");
            }
            let _ = done_tx.send(SearchCompletion { token, outcome });
        });
    }

    fn apply_completion(&mut self, completion: SearchCompletion) {
        let SearchCompletion { token, outcome } = completion;

        if !self.session.is_authenticated() {
            debug!(token, "dropping search result after sign-out");
            return;
        }
        if self.discard_stale && !self.query.is_current(token) {
            debug!(token, "discarding stale search result");
            return;
        }

        let results = outcome.unwrap_or_else(|_| error_result());
        info!(token, count = results.len(), "query finished");
        self.query.complete(results);
        self.publish_screen();
    }

    fn publish_screen(&self) {
        let _ = self.screen_tx.send(self.query.screen());
    }
}
