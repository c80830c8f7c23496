/// Chat completions
///
/// HTTP client for `POST /chat/completions`: streaming requests drive the SSE
/// parser from the response body, non-streaming ones decode a single JSON
/// answer.

/// Chat client
pub mod client;

/// Chat error types
pub mod error;

/// Non-streaming response types
pub mod response;

/// Request and message types
pub mod types;

// Re-export commonly used types
pub use client::ChatClient;
pub use error::{ChatError, ChatResult};
pub use response::{ChatResponse, ToolCall, Usage};
pub use types::{ChatMessage, ChatOptions, ChatRequest, Role};
