/// WebSocket message types for the xAI realtime voice API
///
/// This module defines the JSON events exchanged with
/// `wss://api.x.ai/v1/realtime`. Every event carries a `type` tag.

use serde::{Deserialize, Serialize};

use crate::config::VoiceSessionConfig;

// ============================================================================
// Client -> Server Messages
// ============================================================================

/// Events sent from client to server
///
/// # Example
/// ```
/// use xai_client::network::messages::ClientEvent;
///
/// let json = serde_json::to_string(&ClientEvent::ResponseCreate).unwrap();
/// assert_eq!(json, r#"{"type":"response.create"}"#);
/// ```
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Configure voice, instructions, turn detection and audio format
    #[serde(rename = "session.update")]
    SessionUpdate {
        /// Session parameters
        session: SessionParams,
    },

    /// Append a user message to the conversation
    #[serde(rename = "conversation.item.create")]
    ConversationItemCreate {
        /// The conversation item
        item: ConversationItem,
    },

    /// Ask the server to generate a response
    #[serde(rename = "response.create")]
    ResponseCreate,
}

impl ClientEvent {
    /// Build a `session.update` from session settings
    pub fn session_update(settings: &VoiceSessionConfig) -> Self {
        ClientEvent::SessionUpdate {
            session: SessionParams::from_settings(settings),
        }
    }

    /// Build a `conversation.item.create` carrying user text
    pub fn user_text(text: impl Into<String>) -> Self {
        ClientEvent::ConversationItemCreate {
            item: ConversationItem::user_text(text),
        }
    }

    /// Get the wire `type` tag of this event
    pub fn event_type(&self) -> &'static str {
        match self {
            ClientEvent::SessionUpdate { .. } => "session.update",
            ClientEvent::ConversationItemCreate { .. } => "conversation.item.create",
            ClientEvent::ResponseCreate => "response.create",
        }
    }
}

/// Session parameters of a `session.update`
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SessionParams {
    /// Voice name (e.g. "Ara")
    pub voice: String,

    /// System instructions
    pub instructions: String,

    /// Server-side voice activity detection; `null` for text turns
    pub turn_detection: Option<TurnDetection>,

    /// Input and output audio formats
    pub audio: AudioParams,
}

impl SessionParams {
    /// Create parameters from session settings
    pub fn from_settings(settings: &VoiceSessionConfig) -> Self {
        let format = AudioFormat::pcm(settings.sample_rate_hz);

        Self {
            voice: settings.voice.clone(),
            instructions: settings.instructions.clone(),
            turn_detection: settings.server_vad.then(TurnDetection::server_vad),
            audio: AudioParams {
                input: AudioDirection {
                    format: format.clone(),
                },
                output: AudioDirection { format },
            },
        }
    }
}

/// Turn detection configuration
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TurnDetection {
    /// Detection strategy ("server_vad")
    #[serde(rename = "type")]
    pub detection_type: String,
}

impl TurnDetection {
    /// Server-side voice activity detection
    pub fn server_vad() -> Self {
        Self {
            detection_type: "server_vad".to_string(),
        }
    }
}

/// Input/output audio configuration
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AudioParams {
    /// Microphone side
    pub input: AudioDirection,
    /// Speaker side
    pub output: AudioDirection,
}

/// Audio configuration for one direction
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AudioDirection {
    /// Audio format
    pub format: AudioFormat,
}

/// Audio format descriptor
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AudioFormat {
    /// MIME-like format type (always "audio/pcm")
    #[serde(rename = "type")]
    pub format_type: String,

    /// Sample rate in Hz
    pub rate: u32,
}

impl AudioFormat {
    /// 16-bit little-endian PCM at the given rate
    pub fn pcm(rate: u32) -> Self {
        Self {
            format_type: "audio/pcm".to_string(),
            rate,
        }
    }
}

/// A conversation item
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ConversationItem {
    /// Item type (always "message")
    #[serde(rename = "type")]
    pub item_type: String,

    /// Author role ("user")
    pub role: String,

    /// Content parts
    pub content: Vec<ContentPart>,
}

impl ConversationItem {
    /// A user message with a single text part
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            item_type: "message".to_string(),
            role: "user".to_string(),
            content: vec![ContentPart::InputText { text: text.into() }],
        }
    }
}

/// One part of a conversation item
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ContentPart {
    /// Plain user text
    #[serde(rename = "input_text")]
    InputText {
        /// The text
        text: String,
    },
}

// ============================================================================
// Server -> Client Messages
// ============================================================================

/// Events received from the server
///
/// Uses serde's tagged enum feature to deserialize based on the `type`
/// field. Types the client does not act on map to [`ServerEvent::Other`].
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Session configuration was applied; turns may now be sent
    #[serde(rename = "session.updated")]
    SessionUpdated,

    /// The server started generating a response
    #[serde(rename = "response.created")]
    ResponseCreated,

    /// The response is complete
    #[serde(rename = "response.done")]
    ResponseDone,

    /// Incremental transcript of the spoken response
    #[serde(rename = "response.output_audio_transcript.delta")]
    TranscriptDelta {
        /// Transcript text
        #[serde(default)]
        delta: Option<String>,
    },

    /// Incremental base64-encoded PCM16 audio
    #[serde(rename = "response.output_audio.delta")]
    AudioDelta {
        /// Base64 audio payload
        #[serde(default)]
        delta: Option<String>,
    },

    /// Any other event type
    #[serde(other)]
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(server_vad: bool) -> VoiceSessionConfig {
        VoiceSessionConfig {
            voice: "Ara".to_string(),
            instructions: "Be brief.".to_string(),
            sample_rate_hz: 16000,
            server_vad,
        }
    }

    #[test]
    fn test_session_update_text_turns() {
        let msg = ClientEvent::session_update(&settings(false));
        let value = serde_json::to_value(&msg).unwrap();

        assert_eq!(value["type"], "session.update");
        assert_eq!(value["session"]["voice"], "Ara");
        assert_eq!(value["session"]["instructions"], "Be brief.");
        assert!(value["session"]["turn_detection"].is_null());
        assert!(value["session"].as_object().unwrap().contains_key("turn_detection"));
        assert_eq!(value["session"]["audio"]["input"]["format"]["type"], "audio/pcm");
        assert_eq!(value["session"]["audio"]["output"]["format"]["rate"], 16000);
    }

    #[test]
    fn test_session_update_server_vad() {
        let msg = ClientEvent::session_update(&settings(true));
        let value = serde_json::to_value(&msg).unwrap();

        assert_eq!(value["session"]["turn_detection"]["type"], "server_vad");
    }

    #[test]
    fn test_user_text_item() {
        let msg = ClientEvent::user_text("say \"hi\"");
        let json = serde_json::to_string(&msg).unwrap();

        assert_eq!(
            json,
            r#"{"type":"conversation.item.create","item":{"type":"message","role":"user","content":[{"type":"input_text","text":"say \"hi\""}]}}"#
        );
        assert_eq!(msg.event_type(), "conversation.item.create");
    }

    #[test]
    fn test_response_create() {
        let json = serde_json::to_string(&ClientEvent::ResponseCreate).unwrap();
        assert_eq!(json, r#"{"type":"response.create"}"#);
    }

    #[test]
    fn test_server_event_unit_variants_ignore_extra_fields() {
        let msg: ServerEvent =
            serde_json::from_str(r#"{"type":"response.done","response":{"id":"r1"}}"#).unwrap();
        assert_eq!(msg, ServerEvent::ResponseDone);

        let msg: ServerEvent =
            serde_json::from_str(r#"{"type":"session.updated","session":{}}"#).unwrap();
        assert_eq!(msg, ServerEvent::SessionUpdated);
    }

    #[test]
    fn test_server_event_transcript_delta() {
        let msg: ServerEvent = serde_json::from_str(
            r#"{"type":"response.output_audio_transcript.delta","delta":"Hello"}"#,
        )
        .unwrap();

        assert_eq!(
            msg,
            ServerEvent::TranscriptDelta {
                delta: Some("Hello".to_string())
            }
        );
    }

    #[test]
    fn test_server_event_unknown_type() {
        let msg: ServerEvent =
            serde_json::from_str(r#"{"type":"input_audio_buffer.speech_started"}"#).unwrap();
        assert_eq!(msg, ServerEvent::Other);
    }

    #[test]
    fn test_server_event_missing_delta() {
        let msg: ServerEvent =
            serde_json::from_str(r#"{"type":"response.output_audio.delta"}"#).unwrap();
        assert_eq!(msg, ServerEvent::AudioDelta { delta: None });
    }
}
