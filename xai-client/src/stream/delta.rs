/// Delta extraction for streaming chat-completion chunks
///
/// Given one complete `data:` payload, decides whether it is the end-of-stream
/// sentinel or a JSON chunk carrying a content delta and/or a finish reason.
///
/// Chunk shape consumed:
/// ```text
/// {"choices":[{"delta":{"content":"Hello"},"finish_reason":null}]}
/// ```

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::stream::parser::StreamEvent;

/// In-band literal that terminates a stream
pub const DONE_SENTINEL: &[u8] = b"[DONE]";

/// Outcome of extracting a single `data:` payload
///
/// A single chunk may carry both a final piece of content and a finish
/// reason, so delta and end are not mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    /// Nothing to deliver (malformed JSON, no content, empty payload)
    Nothing,
    /// A content delta
    Delta(String),
    /// End of stream, no content
    End,
    /// A content delta followed by end of stream
    DeltaThenEnd(String),
}

impl Extracted {
    fn from_parts(content: Option<String>, finished: bool) -> Self {
        match (content, finished) {
            (Some(text), true) => Extracted::DeltaThenEnd(text),
            (Some(text), false) => Extracted::Delta(text),
            (None, true) => Extracted::End,
            (None, false) => Extracted::Nothing,
        }
    }

    /// Get the content delta, if any
    pub fn delta(&self) -> Option<&str> {
        match self {
            Extracted::Delta(text) | Extracted::DeltaThenEnd(text) => Some(text),
            _ => None,
        }
    }

    /// Check if this outcome terminates the stream
    pub fn is_end(&self) -> bool {
        matches!(self, Extracted::End | Extracted::DeltaThenEnd(_))
    }

    /// Convert into the callback sequence: delta first, then end
    pub fn into_events(self) -> impl Iterator<Item = StreamEvent> {
        let (delta, end) = match self {
            Extracted::Nothing => (None, false),
            Extracted::Delta(text) => (Some(text), false),
            Extracted::End => (None, true),
            Extracted::DeltaThenEnd(text) => (Some(text), true),
        };

        delta
            .map(StreamEvent::Delta)
            .into_iter()
            .chain(end.then_some(StreamEvent::Done))
    }
}

#[derive(Deserialize, Debug)]
struct ChatChunk {
    /// Kept loose; only `choices[0]` is inspected
    #[serde(default)]
    choices: Value,

    #[serde(default)]
    error: Option<Value>,
}

/// Extract the content delta and end signal from one `data:` payload
///
/// Malformed JSON is logged and yields [`Extracted::Nothing`]; it never
/// affects the parsing of later payloads.
///
/// # Example
/// ```
/// use xai_client::stream::{extract, Extracted};
///
/// let out = extract(br#"{"choices":[{"delta":{"content":"Hi"}}]}"#);
/// assert_eq!(out, Extracted::Delta("Hi".to_string()));
///
/// assert_eq!(extract(b"[DONE]"), Extracted::End);
/// ```
pub fn extract(payload: &[u8]) -> Extracted {
    if payload == DONE_SENTINEL {
        return Extracted::End;
    }

    if payload.is_empty() {
        debug!("Empty data payload, nothing to extract");
        return Extracted::Nothing;
    }

    let chunk: ChatChunk = match serde_json::from_slice(payload) {
        Ok(chunk) => chunk,
        Err(e) => {
            warn!("Failed to parse stream chunk JSON: {}", e);
            return Extracted::Nothing;
        }
    };

    if let Some(error) = chunk.error {
        warn!("Stream chunk carried an error object: {}", error);
    }

    let Some(choice) = chunk.choices.get(0) else {
        return Extracted::Nothing;
    };

    // delta.content and finish_reason are read independently
    let content = choice
        .get("delta")
        .and_then(|delta| delta.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let finished = choice
        .get("finish_reason")
        .is_some_and(|reason| !reason.is_null());

    Extracted::from_parts(content, finished)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_done_sentinel() {
        assert_eq!(extract(b"[DONE]"), Extracted::End);
    }

    #[test]
    fn test_done_sentinel_is_case_sensitive() {
        // Not JSON either, so it is simply dropped
        assert_eq!(extract(b"[done]"), Extracted::Nothing);
        assert_eq!(extract(b"[DONE] "), Extracted::Nothing);
    }

    #[test]
    fn test_content_delta() {
        let out = extract(br#"{"choices":[{"delta":{"content":"Hello"}}]}"#);
        assert_eq!(out, Extracted::Delta("Hello".to_string()));
        assert_eq!(out.delta(), Some("Hello"));
        assert!(!out.is_end());
    }

    #[test]
    fn test_null_finish_reason_is_not_end() {
        let out = extract(br#"{"choices":[{"delta":{"content":"a"},"finish_reason":null}]}"#);
        assert_eq!(out, Extracted::Delta("a".to_string()));
    }

    #[test]
    fn test_delta_and_finish_reason() {
        let out = extract(br#"{"choices":[{"delta":{"content":"!"},"finish_reason":"stop"}]}"#);
        assert_eq!(out, Extracted::DeltaThenEnd("!".to_string()));

        let events: Vec<_> = out.into_events().collect();
        assert_eq!(
            events,
            vec![StreamEvent::Delta("!".to_string()), StreamEvent::Done]
        );
    }

    #[test]
    fn test_finish_reason_without_content() {
        let out = extract(br#"{"choices":[{"delta":{},"finish_reason":"length"}]}"#);
        assert_eq!(out, Extracted::End);
    }

    #[test]
    fn test_role_only_delta() {
        let out = extract(br#"{"choices":[{"delta":{"role":"assistant"}}]}"#);
        assert_eq!(out, Extracted::Nothing);
        assert_eq!(out.into_events().count(), 0);
    }

    #[test]
    fn test_non_string_content_ignored() {
        let out = extract(br#"{"choices":[{"delta":{"content":42}}]}"#);
        assert_eq!(out, Extracted::Nothing);
    }

    #[test]
    fn test_empty_choices() {
        assert_eq!(extract(br#"{"choices":[]}"#), Extracted::Nothing);
        assert_eq!(extract(br#"{"id":"chatcmpl-1"}"#), Extracted::Nothing);
    }

    #[test]
    fn test_malformed_json() {
        assert_eq!(extract(br#"{"choices":[{"delta":"#), Extracted::Nothing);
        assert_eq!(extract(b"not json"), Extracted::Nothing);
    }

    #[test]
    fn test_empty_payload() {
        assert_eq!(extract(b""), Extracted::Nothing);
    }

    #[test]
    fn test_only_first_choice_is_read() {
        let out = extract(
            br#"{"choices":[{"delta":{"content":"first"}},{"delta":{"content":"second"}}]}"#,
        );
        assert_eq!(out, Extracted::Delta("first".to_string()));
    }

    #[test]
    fn test_odd_sibling_choice_keeps_delta() {
        let out = extract(br#"{"choices":[{"delta":{"content":"Hi"}},null]}"#);
        assert_eq!(out, Extracted::Delta("Hi".to_string()));
    }

    #[test]
    fn test_non_object_delta_still_ends() {
        let out = extract(br#"{"choices":[{"delta":"x","finish_reason":"stop"}]}"#);
        assert_eq!(out, Extracted::End);
    }

    #[test]
    fn test_non_array_choices() {
        assert_eq!(extract(br#"{"choices":{"delta":{"content":"x"}}}"#), Extracted::Nothing);
        assert_eq!(extract(br#"{"choices":null}"#), Extracted::Nothing);
    }

    #[test]
    fn test_error_object_yields_nothing() {
        let out = extract(br#"{"error":{"message":"overloaded"}}"#);
        assert_eq!(out, Extracted::Nothing);
    }
}
