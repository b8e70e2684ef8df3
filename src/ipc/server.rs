//! Unix domain socket server for IPC
//!
//! Provides request-response communication and pushes notifications and
//! screen updates to subscribed clients.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::capture::RecognizerFeed;
use crate::events::Notification;
use crate::pipeline::PipelineHandle;
use crate::presenter::Screen;

use super::protocol::{DaemonStatus, Push, Request, Response, MAX_MESSAGE_LEN};

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: UnixListener,
    context: Arc<ClientContext>,
    shutdown_tx: broadcast::Sender<()>,
}

/// What every client handler needs
struct ClientContext {
    pipeline: PipelineHandle,
    feed: RecognizerFeed,
    notifications: broadcast::Sender<Notification>,
    screens: broadcast::Sender<Screen>,
    start_time: Instant,
}

impl Server {
    /// Create a new IPC server
    pub fn new(
        socket_path: &Path,
        pipeline: PipelineHandle,
        feed: RecognizerFeed,
        notifications: broadcast::Sender<Notification>,
        screens: broadcast::Sender<Screen>,
    ) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Owner-only access
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener,
            context: Arc::new(ClientContext {
                pipeline,
                feed,
                notifications,
                screens,
                start_time: Instant::now(),
            }),
            shutdown_tx,
        })
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let context = Arc::clone(&self.context);
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = Self::handle_client(stream, context) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Handle a single client connection
    async fn handle_client(stream: UnixStream, context: Arc<ClientContext>) -> Result<()> {
        let (mut reader, mut writer) = stream.into_split();

        // Frames are read on their own task so a push never interrupts a
        // partially read request.
        let (request_tx, mut request_rx) = mpsc::channel::<Result<Request, String>>(8);
        let reader_task = tokio::spawn(async move {
            loop {
                let frame = match read_frame(&mut reader).await {
                    Ok(Some(frame)) => frame,
                    Ok(None) => break,
                    Err(e) => {
                        warn!(?e, "failed to read request");
                        break;
                    }
                };
                let parsed = serde_json::from_slice::<Request>(&frame).map_err(|e| e.to_string());
                if request_tx.send(parsed).await.is_err() {
                    break;
                }
            }
        });

        let mut notifications: Option<broadcast::Receiver<Notification>> = None;
        let mut screens: Option<broadcast::Receiver<Screen>> = None;

        let result = loop {
            tokio::select! {
                request = request_rx.recv() => {
                    let Some(request) = request else {
                        debug!("client disconnected");
                        break Ok(());
                    };

                    let response = match request {
                        Ok(request) => {
                            debug!(?request, "received request");
                            let (response, subscribe) = Self::process_request(request, &context).await;
                            if subscribe && notifications.is_none() {
                                notifications = Some(context.notifications.subscribe());
                                screens = Some(context.screens.subscribe());
                                debug!("client subscribed to notifications");
                            }
                            response
                        }
                        Err(message) => Response::Error {
                            code: "bad_request".to_string(),
                            message,
                        },
                    };

                    if let Err(e) = write_frame(&mut writer, &response).await {
                        break Err(e);
                    }
                }
                Some(notification) = recv_push(&mut notifications) => {
                    if let Err(e) = write_frame(&mut writer, &Push::Notification(notification)).await {
                        break Err(e);
                    }
                }
                Some(screen) = recv_push(&mut screens) => {
                    if let Err(e) = write_frame(&mut writer, &Push::ViewChanged(screen)).await {
                        break Err(e);
                    }
                }
            }
        };

        reader_task.abort();
        result
    }

    /// Process a request and return a response
    /// Returns (Response, should_subscribe)
    async fn process_request(request: Request, context: &ClientContext) -> (Response, bool) {
        let response = match request {
            Request::Ping => Response::Pong,

            Request::GetStatus => match context.pipeline.snapshot().await {
                Ok(snapshot) => Response::Status(DaemonStatus::from_snapshot(
                    snapshot,
                    context.start_time.elapsed().as_secs(),
                )),
                Err(e) => e.into(),
            },

            Request::SignIn { profile } => match context.pipeline.sign_in(profile).await {
                Ok(()) => Response::Ok,
                Err(e) => e.into(),
            },

            Request::SignOut => match context.pipeline.sign_out().await {
                Ok(()) => Response::Ok,
                Err(e) => e.into(),
            },

            Request::ToggleListening => match context.pipeline.toggle_listening().await {
                Ok(state) => Response::Capture { state },
                Err(e) => e.into(),
            },

            Request::StopListening => match context.pipeline.stop_listening().await {
                Ok(state) => Response::Capture { state },
                Err(e) => e.into(),
            },

            Request::Utterance {
                transcript,
                confidence,
            } => Self::fed(context.feed.transcript(&transcript, confidence.unwrap_or(1.0))),

            Request::RecognitionError { code } => Self::fed(context.feed.error(&code)),

            Request::RecognitionEnd => Self::fed(context.feed.end()),

            Request::GetView => match context.pipeline.screen().await {
                Ok(screen) => Response::View(screen),
                Err(e) => e.into(),
            },

            Request::Subscribe => return (Response::Subscribed, true),
        };

        (response, false)
    }

    fn fed(accepted: bool) -> Response {
        if accepted {
            Response::Ok
        } else {
            Response::Error {
                code: "not_listening".to_string(),
                message: "no capture in progress".to_string(),
            }
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        // Remove socket file
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}

/// Next pushed item, or pending forever when not subscribed
async fn recv_push<T: Clone>(rx: &mut Option<broadcast::Receiver<T>>) -> Option<T> {
    let Some(rx) = rx else {
        return std::future::pending().await;
    };
    loop {
        match rx.recv().await {
            Ok(item) => return Some(item),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(skipped = n, "push receiver lagged");
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}

/// Read one length-prefixed frame. `None` on a clean disconnect.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_LEN {
        anyhow::bail!("message too large: {len} bytes");
    }

    let mut msg_buf = vec![0u8; len];
    reader
        .read_exact(&mut msg_buf)
        .await
        .context("truncated message body")?;
    Ok(Some(msg_buf))
}

/// Send a length-prefixed JSON message
pub async fn write_frame<W, T>(writer: &mut W, msg: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let msg_bytes = serde_json::to_vec(msg)?;
    let msg_len = (msg_bytes.len() as u32).to_le_bytes();

    writer.write_all(&msg_len).await?;
    writer.write_all(&msg_bytes).await?;
    writer.flush().await?;

    Ok(())
}
