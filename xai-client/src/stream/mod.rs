/// Server-Sent Events stream handling
///
/// This module turns the raw, arbitrarily chunked body of a streaming
/// chat-completions response into content deltas and an end-of-stream signal.

/// Incremental byte-oriented SSE parser
pub mod parser;

/// Content delta extraction from a single `data:` payload
pub mod delta;

// Re-export commonly used types
pub use delta::{extract, Extracted, DONE_SENTINEL};
pub use parser::{ParserState, SseParser, StreamEvent, DEFAULT_DATA_CAPACITY, FIELD_NAME_CAPACITY};
