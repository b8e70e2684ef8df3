//! echo-search-daemon: Background daemon for a voice search assistant
//!
//! The daemon owns the voice-capture-to-result pipeline:
//! - Session store gating access on a signed-in profile
//! - Capture controller toggling speech recognition
//! - Query classifier synthesizing mock search results
//! - Presenter rendering the result screen for clients
//!
//! Front ends connect over a Unix socket, forward what their speech engine
//! hears, and subscribe to notifications and screen updates.

mod capture;
mod config;
mod error;
mod events;
mod ipc;
mod lifecycle;
mod pipeline;
mod presenter;
mod search;
mod session;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::capture::{CaptureController, RecognitionOptions, RemoteRecognizer};
use crate::config::Config;
use crate::events::{BroadcastNotifier, Notification, NotificationSink};
use crate::ipc::Server;
use crate::lifecycle::ShutdownSignal;
use crate::pipeline::{Pipeline, PipelineHandle};
use crate::presenter::Screen;
use crate::search::SearchService;
use crate::session::{FileStorage, SessionStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "echo-search-daemon starting"
    );

    // Load configuration
    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(
        ?config.socket_path,
        speech_enabled = config.speech_enabled,
        discard_stale_results = config.discard_stale_results,
        "configuration loaded"
    );

    // Create shutdown signal handler
    let shutdown = ShutdownSignal::new();

    // Pipeline -> subscribed IPC clients
    let (notification_tx, _) = broadcast::channel::<Notification>(64);
    let (screen_tx, _) = broadcast::channel::<Screen>(64);
    let notifier: Arc<dyn NotificationSink> =
        Arc::new(BroadcastNotifier::new(notification_tx.clone()));

    // Recognizer -> pipeline
    let (recognition_tx, recognition_rx) = mpsc::unbounded_channel();
    let (recognizer, feed) = RemoteRecognizer::new(
        recognition_tx,
        config.speech_enabled,
        config.no_speech_timeout,
    );
    if !config.speech_enabled {
        warn!("speech recognition disabled by configuration");
    }

    let capture = CaptureController::new(
        Box::new(recognizer),
        RecognitionOptions {
            language: config.language.clone(),
            ..RecognitionOptions::default()
        },
        Arc::clone(&notifier),
    );
    let session = SessionStore::open(
        Box::new(FileStorage::new(&config.data_dir)),
        Arc::clone(&notifier),
    );
    let search = SearchService::from_config(&config);

    // IPC server -> pipeline
    let (command_tx, command_rx) = mpsc::channel(32);
    let handle = PipelineHandle::new(command_tx);

    let pipeline = Pipeline::new(
        session,
        capture,
        search,
        config.discard_stale_results,
        screen_tx.clone(),
    );
    let pipeline_task = tokio::spawn(pipeline.run(command_rx, recognition_rx));

    let server = Server::new(
        &config.socket_path,
        handle.clone(),
        feed,
        notification_tx,
        screen_tx,
    )?;

    info!("daemon initialized, entering main loop");

    tokio::select! {
        // Run the IPC server (accepts client connections)
        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        // Wait for shutdown signal
        reason = shutdown.wait() => {
            info!(%reason, "shutdown signal received");
        }
    }

    // Cleanup
    info!("shutting down...");

    handle.shutdown().await;
    if let Err(e) = pipeline_task.await {
        error!(?e, "pipeline task failed");
    }
    server.shutdown().await;

    info!("echo-search-daemon stopped");

    Ok(())
}
