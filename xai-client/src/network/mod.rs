/// Network communication and WebSocket handling
///
/// This module provides the realtime voice client for the xAI realtime API:
/// fragment reassembly, event dispatch, and the WebSocket transport.

/// Fixed-capacity reassembly of fragmented TEXT payloads
pub mod assembler;

/// Voice client handle
pub mod client;

/// WebSocket connection management
pub mod connection;

/// Realtime event dispatch and session state
pub mod dispatcher;

/// Network error types
pub mod error;

/// WebSocket message type definitions
pub mod messages;

/// Async task driving a session from the socket
pub mod tasks;

// Re-export commonly used types
pub use assembler::{Fragment, WsAssembler};
pub use client::VoiceClient;
pub use connection::{ConnectionConfig, VoiceConnection, WsReader, WsWriter};
pub use dispatcher::{RealtimeSession, VoiceHandler, VoiceState};
pub use error::{NetworkError, NetworkResult};
pub use messages::{ClientEvent, ServerEvent};
pub use tasks::{SessionStatus, VoiceCommand};
