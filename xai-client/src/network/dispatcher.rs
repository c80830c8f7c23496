/// Realtime event dispatcher and session state
///
/// `RealtimeSession` is the synchronous core of a realtime voice connection.
/// It reassembles TEXT fragments, decodes each completed JSON message once,
/// routes it by its `type` tag, and tracks whether the session is ready for a
/// text turn. It performs no I/O: outbound events are returned to the caller,
/// which owns the socket.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::audio::PcmDecoder;
use crate::config::{VoiceConfig, VoiceSessionConfig};
use crate::network::assembler::{Fragment, WsAssembler};
use crate::network::error::{NetworkError, NetworkResult};
use crate::network::messages::{ClientEvent, ServerEvent};

/// Realtime client state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    /// Transport is down
    Disconnected,
    /// Transport is being established
    Connecting,
    /// Transport is up, session not configured yet
    Connected,
    /// `session.updated` received; turns may be sent
    SessionReady,
    /// `response.created` received
    TurnStarted,
    /// `response.done` received
    TurnDone,
    /// A transport or decoding error occurred
    Error,
}

/// Callbacks for realtime voice events
///
/// All methods have no-op defaults. They are invoked from the task that
/// drives the connection; borrowed arguments are only valid for the call.
pub trait VoiceHandler {
    /// State change, with an optional short detail for errors
    fn on_state(&mut self, _state: VoiceState, _detail: Option<&str>) {}

    /// Transcript text of the spoken response
    fn on_transcript_delta(&mut self, _text: &str) {}

    /// Decoded PCM16 audio
    fn on_pcm16(&mut self, _samples: &[i16], _sample_rate_hz: u32) {}

    /// Every completed message with a `type` tag, before routing
    fn on_event_json(&mut self, _event_type: &str, _json: &[u8]) {}
}

/// Synchronous realtime session core
///
/// # Example
/// ```
/// use xai_client::config::VoiceConfig;
/// use xai_client::network::assembler::Fragment;
/// use xai_client::network::dispatcher::{RealtimeSession, VoiceHandler};
///
/// struct Quiet;
/// impl VoiceHandler for Quiet {}
///
/// let mut session = RealtimeSession::from_config(&VoiceConfig::default(), Quiet);
/// let _session_update = session.on_connected();
///
/// session.on_text_fragment(&Fragment::whole(br#"{"type":"session.updated"}"#));
/// assert!(session.is_ready());
/// ```
pub struct RealtimeSession<B, H> {
    assembler: WsAssembler<B>,
    pcm: PcmDecoder,
    handler: H,

    settings: VoiceSessionConfig,
    queue_turn_before_ready: bool,

    connected: bool,
    session_ready: bool,
    in_turn: bool,

    /// One text turn waiting for `session.updated`
    pending_text: Option<String>,
}

impl<H> RealtimeSession<Vec<u8>, H>
where
    H: VoiceHandler,
{
    /// Create a session with buffers sized from configuration
    pub fn from_config(config: &VoiceConfig, handler: H) -> Self {
        Self::new(vec![0u8; config.max_message_size], config, handler)
    }
}

impl<B, H> RealtimeSession<B, H>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
    H: VoiceHandler,
{
    /// Create a session over a caller-owned reassembly buffer
    pub fn new(buffer: B, config: &VoiceConfig, handler: H) -> Self {
        Self {
            assembler: WsAssembler::new(buffer),
            pcm: PcmDecoder::new(config.pcm_buffer_bytes),
            handler,
            settings: config.session.clone(),
            queue_turn_before_ready: config.queue_turn_before_ready,
            connected: false,
            session_ready: false,
            in_turn: false,
            pending_text: None,
        }
    }

    /// Transport connection is starting
    pub fn on_connecting(&mut self) {
        self.emit_state(VoiceState::Connecting, None);
    }

    /// Transport connected
    ///
    /// # Returns
    /// The `session.update` to send immediately
    pub fn on_connected(&mut self) -> ClientEvent {
        self.connected = true;
        self.session_ready = false;
        self.in_turn = false;
        self.assembler.reset();
        self.emit_state(VoiceState::Connected, None);

        ClientEvent::session_update(&self.settings)
    }

    /// Transport disconnected
    pub fn on_disconnected(&mut self) {
        self.connected = false;
        self.session_ready = false;
        self.in_turn = false;
        self.assembler.reset();
        self.emit_state(VoiceState::Disconnected, None);
    }

    /// Transport reported an error
    pub fn on_transport_error(&mut self, detail: &str) {
        self.emit_state(VoiceState::Error, Some(detail));
    }

    /// Feed one TEXT fragment
    ///
    /// Control frames must be filtered by the caller.
    ///
    /// # Returns
    /// Outbound events triggered by this fragment (a queued text turn)
    pub fn on_text_fragment(&mut self, fragment: &Fragment<'_>) -> Vec<ClientEvent> {
        if !self.assembler.feed_fragment(fragment) {
            return Vec::new();
        }

        let Some(message) = self.assembler.message() else {
            return Vec::new();
        };

        let value: Value = match serde_json::from_slice(message) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to parse realtime message: {}", e);
                self.emit_state(VoiceState::Error, Some("json parse failed"));
                return Vec::new();
            }
        };

        let Some(event_type) = value.get("type").and_then(Value::as_str) else {
            debug!("Ignoring realtime message without a type");
            return Vec::new();
        };

        debug!(event_type, len = message.len(), "Realtime message");
        self.handler.on_event_json(event_type, message);

        self.route(event_type, &value)
    }

    /// Send a text turn
    ///
    /// If the session is not ready yet, the turn is queued when
    /// `queue_turn_before_ready` is set (replacing any earlier queued turn),
    /// otherwise `SessionNotReady` is returned.
    ///
    /// # Returns
    /// The outbound `conversation.item.create` and `response.create`, or
    /// nothing if the turn was queued
    pub fn send_text_turn(&mut self, text: &str) -> NetworkResult<Vec<ClientEvent>> {
        if !self.session_ready {
            if self.queue_turn_before_ready {
                debug!("Session not ready, queueing text turn");
                self.pending_text = Some(text.to_string());
                return Ok(Vec::new());
            }
            return Err(NetworkError::SessionNotReady);
        }

        self.turn_events(text)
    }

    /// Check if the transport is connected
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Check if `session.updated` has been received
    pub fn is_ready(&self) -> bool {
        self.session_ready
    }

    /// Check if a response is being generated
    pub fn is_in_turn(&self) -> bool {
        self.in_turn
    }

    /// Check if a text turn is queued
    pub fn has_pending_turn(&self) -> bool {
        self.pending_text.is_some()
    }

    /// Access the handler
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Mutable access to the handler
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Access the reassembly state
    pub fn assembler(&self) -> &WsAssembler<B> {
        &self.assembler
    }

    fn route(&mut self, event_type: &str, value: &Value) -> Vec<ClientEvent> {
        let event = match ServerEvent::deserialize(value) {
            Ok(event) => event,
            Err(e) => {
                warn!(event_type, "Malformed realtime event: {}", e);
                return Vec::new();
            }
        };

        match event {
            ServerEvent::SessionUpdated => {
                self.session_ready = true;
                self.emit_state(VoiceState::SessionReady, None);

                if let Some(text) = self.pending_text.take() {
                    info!("Session ready, sending queued text turn");
                    match self.turn_events(&text) {
                        Ok(events) => return events,
                        Err(e) => warn!("Failed to send queued text turn: {}", e),
                    }
                }
            }
            ServerEvent::ResponseCreated => {
                self.emit_state(VoiceState::TurnStarted, None);
            }
            ServerEvent::ResponseDone => {
                self.in_turn = false;
                self.emit_state(VoiceState::TurnDone, None);
            }
            ServerEvent::TranscriptDelta { delta: Some(text) } => {
                self.handler.on_transcript_delta(&text);
            }
            ServerEvent::AudioDelta { delta: Some(audio) } => {
                match self.pcm.decode(&audio) {
                    Ok(samples) => {
                        self.handler.on_pcm16(samples, self.settings.sample_rate_hz);
                    }
                    Err(e) => {
                        warn!("Failed to decode audio delta: {}", e);
                        self.emit_state(VoiceState::Error, Some(e.state_detail()));
                    }
                }
            }
            ServerEvent::TranscriptDelta { delta: None }
            | ServerEvent::AudioDelta { delta: None }
            | ServerEvent::Other => {}
        }

        Vec::new()
    }

    fn turn_events(&mut self, text: &str) -> NetworkResult<Vec<ClientEvent>> {
        if !self.connected {
            return Err(NetworkError::NotConnected);
        }
        if !self.session_ready {
            return Err(NetworkError::SessionNotReady);
        }
        if self.in_turn {
            return Err(NetworkError::TurnInProgress);
        }

        self.in_turn = true;
        Ok(vec![ClientEvent::user_text(text), ClientEvent::ResponseCreate])
    }

    fn emit_state(&mut self, state: VoiceState, detail: Option<&str>) {
        match detail {
            Some(detail) => info!(?state, detail, "Voice state changed"),
            None => info!(?state, "Voice state changed"),
        }
        self.handler.on_state(state, detail);
    }
}
