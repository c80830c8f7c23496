/// Network error types for the realtime voice client
///
/// This module defines error types used throughout the network layer.

use thiserror::Error;

/// Network-related errors
#[derive(Error, Debug)]
pub enum NetworkError {
    /// Failed to connect to server
    #[error("Failed to connect to server: {0}")]
    ConnectionFailed(String),

    /// Authentication failed (invalid API key)
    #[error("Authentication failed: invalid API key")]
    AuthenticationFailed,

    /// Connection timeout
    #[error("Connection timeout after {0}ms")]
    Timeout(u64),

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocketError(#[from] tokio_tungstenite::tungstenite::Error),

    /// Failed to serialize message
    #[error("Failed to serialize message: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Connection closed unexpectedly
    #[error("Connection closed unexpectedly")]
    ConnectionClosed,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Transport is not connected
    #[error("Not connected")]
    NotConnected,

    /// `session.updated` has not been received yet
    #[error("Session not ready")]
    SessionNotReady,

    /// A response is still being generated
    #[error("A turn is already in progress")]
    TurnInProgress,

    /// The background session task failed or panicked
    #[error("Session task failed: {0}")]
    TaskFailed(String),
}

/// Result type for network operations
pub type NetworkResult<T> = Result<T, NetworkError>;
