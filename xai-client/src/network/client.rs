/// Realtime voice client handle
///
/// `VoiceClient` connects, spawns the session task and exposes a small async
/// API over the command channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::network::connection::{ConnectionConfig, VoiceConnection};
use crate::network::dispatcher::{RealtimeSession, VoiceHandler};
use crate::network::error::{NetworkError, NetworkResult};
use crate::network::tasks::{session_task, SessionStatus, VoiceCommand};

/// Capacity of the command channel
const COMMAND_CHANNEL_CAPACITY: usize = 16;

/// Handle to a running realtime voice session
///
/// # Example
/// ```no_run
/// use xai_client::config::ClientConfig;
/// use xai_client::network::{VoiceClient, VoiceHandler};
///
/// struct Printer;
///
/// impl VoiceHandler for Printer {
///     fn on_transcript_delta(&mut self, text: &str) {
///         print!("{}", text);
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let config = ClientConfig::new("xai-key");
///     let client = VoiceClient::connect(&config, Printer).await.unwrap();
///
///     while !client.is_ready() {
///         tokio::time::sleep(std::time::Duration::from_millis(50)).await;
///     }
///     client.send_text_turn("Tell me a joke").await.unwrap();
///
///     client.disconnect().await.unwrap();
/// }
/// ```
pub struct VoiceClient {
    commands: mpsc::Sender<VoiceCommand>,
    status: Arc<SessionStatus>,
    task: JoinHandle<NetworkResult<()>>,
    close_timeout_ms: u64,
}

impl VoiceClient {
    /// Connect and start the session task
    ///
    /// The handler receives `Connecting`, and on failure `Error` followed by
    /// `Disconnected`, before this returns.
    pub async fn connect<H>(config: &ClientConfig, handler: H) -> NetworkResult<Self>
    where
        H: VoiceHandler + Send + 'static,
    {
        let voice = &config.voice;
        let mut session = RealtimeSession::from_config(voice, handler);
        session.on_connecting();

        let conn_config = ConnectionConfig::from_voice_config(voice, config.voice_api_key());
        let connection = match VoiceConnection::connect(&conn_config).await {
            Ok(connection) => connection,
            Err(e) => {
                session.on_transport_error(&e.to_string());
                session.on_disconnected();
                return Err(e);
            }
        };

        let (writer, reader) = connection.split();
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let status = Arc::new(SessionStatus::default());

        let task_status = status.clone();
        let task = tokio::spawn(async move {
            session_task(writer, reader, session, command_rx, task_status)
                .await
                .map(|_| ())
        });

        info!("Voice client started");

        Ok(Self {
            commands: command_tx,
            status,
            task,
            close_timeout_ms: voice.close_timeout_ms,
        })
    }

    /// Send a user text turn
    ///
    /// # Errors
    /// * `SessionNotReady` - `session.updated` not received (and queueing disabled)
    /// * `TurnInProgress` - the previous response has not finished
    /// * `NotConnected` - the session task has ended
    pub async fn send_text_turn(&self, text: impl Into<String>) -> NetworkResult<()> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.commands
            .send(VoiceCommand::SendText {
                text: text.into(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| NetworkError::NotConnected)?;

        reply_rx.await.map_err(|_| NetworkError::ConnectionClosed)?
    }

    /// Check if the transport is connected
    pub fn is_connected(&self) -> bool {
        self.status.is_connected()
    }

    /// Check if the session accepts text turns
    pub fn is_ready(&self) -> bool {
        self.status.is_ready()
    }

    /// Close the connection and wait for the session task to finish
    pub async fn disconnect(self) -> NetworkResult<()> {
        if self.commands.send(VoiceCommand::Close).await.is_err() {
            info!("Session task already stopped");
        }

        let mut task = self.task;
        match tokio::time::timeout(Duration::from_millis(self.close_timeout_ms), &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(NetworkError::TaskFailed(e.to_string())),
            Err(_) => {
                warn!("Session task did not stop in time, aborting");
                task.abort();
                Err(NetworkError::Timeout(self.close_timeout_ms))
            }
        }
    }
}
