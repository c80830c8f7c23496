/// PCM16 audio decoding
pub mod audio;

/// Streaming chat completions over HTTP
pub mod chat;

/// Client configuration
pub mod config;

/// Realtime voice client over WebSocket
pub mod network;

/// SSE parsing and delta extraction
pub mod stream;

/// Utility modules
pub mod utils;

// Re-export commonly used types
pub use chat::{ChatClient, ChatMessage, ChatOptions};
pub use config::ClientConfig;
pub use network::{VoiceClient, VoiceHandler, VoiceState};
pub use stream::{SseParser, StreamEvent};
