/// Error types for the streaming chat client

use thiserror::Error;

/// Chat-related errors
#[derive(Error, Debug)]
pub enum ChatError {
    /// Transport-level HTTP failure (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered 401
    #[error("Authentication failed: invalid API key")]
    AuthFailed,

    /// Server answered 429
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Any other non-success status
    #[error("API error ({status}): {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// Another request held the client for longer than the lock timeout
    #[error("Client busy: another request did not finish within {0}ms")]
    Busy(u64),

    /// Response body was not valid JSON of the expected shape
    #[error("Failed to decode response: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Response decoded but carried no usable answer
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Invalid call arguments or configuration
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl ChatError {
    /// Map a non-success HTTP status to an error
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            401 => ChatError::AuthFailed,
            429 => ChatError::RateLimited,
            code => ChatError::Api { status: code, body },
        }
    }
}

/// Result type for chat operations
pub type ChatResult<T> = Result<T, ChatError>;
