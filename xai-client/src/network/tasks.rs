/// Async task driving a realtime session from a WebSocket
///
/// The task owns both socket halves and the `RealtimeSession`. Inbound TEXT
/// messages are fed to the session as single complete fragments; outbound
/// events returned by the session are written back immediately. Commands from
/// `VoiceClient` arrive on an mpsc channel.
///
/// tungstenite reassembles continuation frames before the stream yields a
/// message, so this path only ever feeds `Fragment::whole`. Multi-fragment
/// assembly is reached through `RealtimeSession::on_text_fragment` directly
/// (see the dispatcher tests).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, error, info, warn};

use crate::network::assembler::Fragment;
use crate::network::connection::send_event;
use crate::network::dispatcher::{RealtimeSession, VoiceHandler};
use crate::network::error::{NetworkError, NetworkResult};
use crate::network::messages::ClientEvent;

/// Commands accepted by the session task
#[derive(Debug)]
pub enum VoiceCommand {
    /// Send a user text turn; the outcome is reported on `reply`
    SendText {
        /// User text
        text: String,
        /// Result of the send
        reply: oneshot::Sender<NetworkResult<()>>,
    },

    /// Close the connection and end the task
    Close,
}

/// Connection flags shared between the session task and its handles
#[derive(Debug, Default)]
pub struct SessionStatus {
    connected: AtomicBool,
    ready: AtomicBool,
}

impl SessionStatus {
    /// Check if the transport is connected
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Check if the session accepts text turns
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    fn sync<B, H>(&self, session: &RealtimeSession<B, H>)
    where
        B: AsRef<[u8]> + AsMut<[u8]>,
        H: VoiceHandler,
    {
        self.connected.store(session.is_connected(), Ordering::Release);
        self.ready.store(session.is_ready(), Ordering::Release);
    }
}

/// Session task
///
/// Sends `session.update`, then processes socket messages and commands until
/// the peer closes, a `Close` command arrives, every command sender is dropped,
/// or the socket fails.
///
/// # Returns
/// The session after `on_disconnected`, so callers can inspect the handler
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use tokio::sync::mpsc;
/// use xai_client::config::VoiceConfig;
/// use xai_client::network::{ConnectionConfig, VoiceConnection};
/// use xai_client::network::dispatcher::{RealtimeSession, VoiceHandler};
/// use xai_client::network::tasks::{session_task, SessionStatus};
///
/// struct Quiet;
/// impl VoiceHandler for Quiet {}
///
/// #[tokio::main]
/// async fn main() {
///     let config = VoiceConfig::default();
///     let conn = VoiceConnection::connect(&ConnectionConfig::new("xai-key"))
///         .await
///         .unwrap();
///     let (writer, reader) = conn.split();
///
///     let session = RealtimeSession::from_config(&config, Quiet);
///     let (_command_tx, command_rx) = mpsc::channel(8);
///     let status = Arc::new(SessionStatus::default());
///
///     tokio::spawn(session_task(writer, reader, session, command_rx, status));
/// }
/// ```
pub async fn session_task<W, R, B, H>(
    mut writer: W,
    mut reader: R,
    mut session: RealtimeSession<B, H>,
    mut commands: mpsc::Receiver<VoiceCommand>,
    status: Arc<SessionStatus>,
) -> NetworkResult<RealtimeSession<B, H>>
where
    W: Sink<Message, Error = tungstenite::Error> + Unpin,
    R: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
    B: AsRef<[u8]> + AsMut<[u8]>,
    H: VoiceHandler,
{
    info!("Session task started");

    let update = session.on_connected();
    status.sync(&session);

    let mut message_count = 0u64;

    let result = match send_event(&mut writer, &update).await {
        Err(e) => Err(e),
        Ok(()) => loop {
            tokio::select! {
                msg = reader.next() => match msg {
                    Some(Ok(Message::Text(text))) => {
                        message_count += 1;
                        debug!("Received text message #{}: {} bytes", message_count, text.len());

                        let events = session.on_text_fragment(&Fragment::whole(text.as_bytes()));
                        if let Err(e) = send_all(&mut writer, &events).await {
                            break Err(e);
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        info!("Received close frame: {:?}", frame);
                        break Ok(());
                    }
                    Some(Ok(Message::Ping(data))) => {
                        debug!("Received ping, length: {} bytes", data.len());
                    }
                    Some(Ok(Message::Pong(_))) => {
                        debug!("Received pong");
                    }
                    Some(Ok(Message::Binary(data))) => {
                        warn!("Ignoring binary message: {} bytes", data.len());
                    }
                    Some(Ok(Message::Frame(_))) => {
                        debug!("Received raw frame");
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error: {}", e);
                        break Err(NetworkError::WebSocketError(e));
                    }
                    None => {
                        info!("WebSocket stream ended");
                        break Ok(());
                    }
                },

                cmd = commands.recv() => match cmd {
                    Some(VoiceCommand::SendText { text, reply }) => {
                        let outcome = match session.send_text_turn(&text) {
                            Ok(events) => send_all(&mut writer, &events).await,
                            Err(e) => {
                                debug!("Text turn rejected: {}", e);
                                let _ = reply.send(Err(e));
                                status.sync(&session);
                                continue;
                            }
                        };

                        match outcome {
                            Ok(()) => {
                                let _ = reply.send(Ok(()));
                            }
                            Err(e) => {
                                let _ = reply.send(Err(NetworkError::ConnectionClosed));
                                break Err(e);
                            }
                        }
                    }
                    Some(VoiceCommand::Close) | None => {
                        info!("Closing session");
                        if let Err(e) = writer.close().await {
                            warn!("Failed to close WebSocket writer: {}", e);
                        }
                        break Ok(());
                    }
                },
            }

            status.sync(&session);
        },
    };

    if let Err(e) = &result {
        session.on_transport_error(&e.to_string());
    }
    session.on_disconnected();
    status.sync(&session);

    info!(
        "Session task completed: {} messages received",
        message_count
    );

    result.map(|()| session)
}

async fn send_all<W>(writer: &mut W, events: &[ClientEvent]) -> NetworkResult<()>
where
    W: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    for event in events {
        send_event(writer, event).await?;
    }
    Ok(())
}
