/// Incremental Server-Sent Events parser
///
/// A byte-oriented state machine that consumes response-body chunks of any
/// size and alignment and dispatches one event per completed `data:` line.
///
/// SSE wire format consumed:
/// ```text
/// data: {"choices":[{"delta":{"content":"Hello"}}]}
///
/// data: {"choices":[{"delta":{"content":" world"}}]}
///
/// data: [DONE]
/// ```
///
/// Dispatch happens per line terminator rather than per blank line. The
/// upstream API only ever sends single-field `data:` events, so multi-field
/// event buffering is not implemented.

use tracing::{debug, warn};

use crate::stream::delta::{extract, DONE_SENTINEL};

/// Default capacity of the `data:` value buffer (8 KiB)
pub const DEFAULT_DATA_CAPACITY: usize = 8192;

/// Capacity of the field name buffer
pub const FIELD_NAME_CAPACITY: usize = 32;

const DATA_FIELD: &[u8] = b"data";

/// Parser state
///
/// Cycles `Idle -> Field -> Value -> Eol -> Idle`. A line without a colon
/// returns straight to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParserState {
    /// Between lines, skipping terminators
    #[default]
    Idle,
    /// Capturing a field name
    Field,
    /// Capturing a field value
    Value,
    /// Absorbing the line terminator(s)
    Eol,
}

/// Events delivered to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Incremental piece of generated text
    Delta(String),
    /// The stream has ended
    Done,
}

impl StreamEvent {
    /// Get the delta text if this is a delta
    pub fn text(&self) -> Option<&str> {
        match self {
            StreamEvent::Delta(text) => Some(text),
            StreamEvent::Done => None,
        }
    }

    /// Check if this is the end-of-stream signal
    pub fn is_done(&self) -> bool {
        matches!(self, StreamEvent::Done)
    }
}

/// Stateful SSE parser
///
/// One instance per stream. The data buffer is allocated once at
/// construction and never grows past its capacity; excess bytes of an
/// oversized `data:` value are dropped.
///
/// # Example
/// ```
/// use xai_client::stream::{SseParser, StreamEvent};
///
/// let mut parser = SseParser::new();
/// let mut events = Vec::new();
///
/// parser.feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n", |e| events.push(e));
/// parser.feed(b"\ndata: [DONE]\n", |e| events.push(e));
///
/// assert_eq!(events, vec![StreamEvent::Delta("Hi".to_string()), StreamEvent::Done]);
/// ```
#[derive(Debug)]
pub struct SseParser {
    state: ParserState,

    field: [u8; FIELD_NAME_CAPACITY],
    field_len: usize,

    data: Vec<u8>,
    data_capacity: usize,

    /// Current line is a `data` field
    in_data: bool,

    /// One space right after the colon is still to be skipped
    skip_space: bool,

    /// Bytes dropped from the current `data:` value
    dropped: usize,
}

impl SseParser {
    /// Create a parser with the default 8 KiB data buffer
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_DATA_CAPACITY)
    }

    /// Create a parser with a data buffer of `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: ParserState::Idle,
            field: [0; FIELD_NAME_CAPACITY],
            field_len: 0,
            data: Vec::with_capacity(capacity),
            data_capacity: capacity,
            in_data: false,
            skip_space: false,
            dropped: 0,
        }
    }

    /// Feed a chunk of the response body
    ///
    /// `on_event` is invoked for every content delta and end-of-stream
    /// signal completed by this chunk. Splitting the same input into any
    /// number of chunks produces the same callback sequence.
    pub fn feed<F>(&mut self, chunk: &[u8], mut on_event: F)
    where
        F: FnMut(StreamEvent),
    {
        for &byte in chunk {
            self.step(byte, &mut on_event);
        }
    }

    /// Discard all in-progress state
    pub fn reset(&mut self) {
        self.state = ParserState::Idle;
        self.field_len = 0;
        self.data.clear();
        self.in_data = false;
        self.skip_space = false;
        self.dropped = 0;
    }

    /// Current state
    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Capacity of the data buffer
    pub fn data_capacity(&self) -> usize {
        self.data_capacity
    }

    /// Number of bytes currently buffered for the pending `data:` value
    pub fn buffered(&self) -> usize {
        self.data.len()
    }

    fn step<F>(&mut self, byte: u8, on_event: &mut F)
    where
        F: FnMut(StreamEvent),
    {
        match self.state {
            ParserState::Idle => {
                if !is_terminator(byte) {
                    self.begin_field(byte);
                }
            }
            ParserState::Field => {
                if byte == b':' {
                    self.begin_value();
                } else if is_terminator(byte) {
                    debug!("Discarding line without colon");
                    self.state = ParserState::Idle;
                } else {
                    self.push_field(byte);
                }
            }
            ParserState::Value => {
                let skip = std::mem::take(&mut self.skip_space);

                if is_terminator(byte) {
                    self.state = ParserState::Eol;
                    if self.in_data {
                        self.dispatch(on_event);
                    }
                } else if skip && byte == b' ' {
                    // Optional space after the colon
                } else if self.in_data {
                    self.push_data(byte);
                }
            }
            ParserState::Eol => {
                if !is_terminator(byte) {
                    // Start of the next line: reprocess this byte from Idle
                    self.state = ParserState::Idle;
                    self.step(byte, on_event);
                }
            }
        }
    }

    fn begin_field(&mut self, byte: u8) {
        self.field_len = 0;
        self.push_field(byte);
        self.state = ParserState::Field;
    }

    fn begin_value(&mut self) {
        self.state = ParserState::Value;
        self.skip_space = true;
        self.in_data = self.field_name() == DATA_FIELD;

        if self.in_data {
            self.data.clear();
            self.dropped = 0;
        }
    }

    fn field_name(&self) -> &[u8] {
        &self.field[..self.field_len]
    }

    fn push_field(&mut self, byte: u8) {
        // Over-long names are truncated; they can never equal "data"
        if self.field_len < FIELD_NAME_CAPACITY {
            self.field[self.field_len] = byte;
            self.field_len += 1;
        }
    }

    fn push_data(&mut self, byte: u8) {
        if self.data.len() < self.data_capacity {
            self.data.push(byte);
            return;
        }

        if self.dropped == 0 {
            warn!(
                capacity = self.data_capacity,
                "Data buffer overflow, dropping excess bytes"
            );
        }
        self.dropped += 1;
    }

    fn dispatch<F>(&mut self, on_event: &mut F)
    where
        F: FnMut(StreamEvent),
    {
        if self.dropped > 0 {
            warn!(
                kept = self.data.len(),
                dropped = self.dropped,
                "Dispatching truncated data payload"
            );
        }

        debug!(len = self.data.len(), "Received data payload");

        if self.data == DONE_SENTINEL {
            debug!("Stream completed");
            on_event(StreamEvent::Done);
        } else {
            for event in extract(&self.data).into_events() {
                on_event(event);
            }
        }

        self.data.clear();
        self.dropped = 0;
    }
}

impl Default for SseParser {
    fn default() -> Self {
        Self::new()
    }
}

fn is_terminator(byte: u8) -> bool {
    byte == b'\n' || byte == b'\r'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(parser: &mut SseParser, chunks: &[&[u8]]) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        for chunk in chunks {
            parser.feed(chunk, |e| events.push(e));
        }
        events
    }

    fn delta(text: &str) -> StreamEvent {
        StreamEvent::Delta(text.to_string())
    }

    const STREAM: &[u8] = b"data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\r\n\r\n\
: keep-alive\n\
event: message\n\
data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n\
id: 7\n\
data:{\"choices\":[{\"delta\":{\"content\":\"lo\"},\"finish_reason\":null}]}\r\n\
data: {\"choices\":[{\"delta\":{\"content\":\" world\"},\"finish_reason\":\"stop\"}]}\n\n\
data: [DONE]\n\n";

    fn expected_stream() -> Vec<StreamEvent> {
        vec![
            delta("Hel"),
            delta("lo"),
            delta(" world"),
            StreamEvent::Done,
            StreamEvent::Done,
        ]
    }

    #[test]
    fn test_parser_initial_state() {
        let parser = SseParser::new();
        assert_eq!(parser.state(), ParserState::Idle);
        assert_eq!(parser.data_capacity(), DEFAULT_DATA_CAPACITY);
        assert_eq!(parser.buffered(), 0);
    }

    #[test]
    fn test_done_sentinel() {
        let mut parser = SseParser::new();
        let events = feed_all(&mut parser, &[b"data: [DONE]\n"]);
        assert_eq!(events, vec![StreamEvent::Done]);
    }

    #[test]
    fn test_single_delta() {
        let mut parser = SseParser::new();
        let events = feed_all(
            &mut parser,
            &[b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n"],
        );
        assert_eq!(events, vec![delta("Hi")]);
        assert_eq!(events[0].text(), Some("Hi"));
    }

    #[test]
    fn test_full_stream_whole() {
        let mut parser = SseParser::new();
        assert_eq!(feed_all(&mut parser, &[STREAM]), expected_stream());
    }

    #[test]
    fn test_chunk_boundary_invariance_two_way() {
        for split in 0..=STREAM.len() {
            let mut parser = SseParser::new();
            let (a, b) = STREAM.split_at(split);
            assert_eq!(
                feed_all(&mut parser, &[a, b]),
                expected_stream(),
                "split at {}",
                split
            );
        }
    }

    #[test]
    fn test_chunk_boundary_invariance_byte_at_a_time() {
        let mut parser = SseParser::new();
        let chunks: Vec<&[u8]> = STREAM.chunks(1).collect();
        assert_eq!(feed_all(&mut parser, &chunks), expected_stream());
    }

    #[test]
    fn test_chunk_boundary_invariance_varied_sizes() {
        for size in 2..=13 {
            let mut parser = SseParser::new();
            let chunks: Vec<&[u8]> = STREAM.chunks(size).collect();
            assert_eq!(
                feed_all(&mut parser, &chunks),
                expected_stream(),
                "chunk size {}",
                size
            );
        }
    }

    #[test]
    fn test_space_after_colon_split_across_chunks() {
        let mut parser = SseParser::new();
        let events = feed_all(&mut parser, &[b"data:", b" [DONE]\n"]);
        assert_eq!(events, vec![StreamEvent::Done]);
    }

    #[test]
    fn test_only_one_space_skipped() {
        let mut parser = SseParser::new();
        // Two spaces: the payload becomes " [DONE]", which is not the sentinel
        let events = feed_all(&mut parser, &[b"data:  [DONE]\n"]);
        assert!(events.is_empty());
    }

    #[test]
    fn test_empty_chunk_is_noop() {
        let mut parser = SseParser::new();
        let events = feed_all(&mut parser, &[b"", b"data: [DO", b"", b"NE]\n"]);
        assert_eq!(events, vec![StreamEvent::Done]);
    }

    #[test]
    fn test_non_data_fields_ignored() {
        let mut parser = SseParser::new();
        let events = feed_all(
            &mut parser,
            &[b"event: ping\nid: 42\nretry: 1000\ndatax: [DONE]\n"],
        );
        assert!(events.is_empty());
        assert_eq!(parser.state(), ParserState::Eol);
    }

    #[test]
    fn test_line_without_colon_discarded() {
        let mut parser = SseParser::new();
        let events = feed_all(&mut parser, &[b"garbage line\ndata: [DONE]\n"]);
        assert_eq!(events, vec![StreamEvent::Done]);
    }

    #[test]
    fn test_overlong_field_name_ignored() {
        let mut parser = SseParser::new();
        let long_name = "d".repeat(FIELD_NAME_CAPACITY + 10);
        let input = format!("{}: [DONE]\ndata: [DONE]\n", long_name);
        let events = feed_all(&mut parser, &[input.as_bytes()]);
        assert_eq!(events, vec![StreamEvent::Done]);
    }

    #[test]
    fn test_malformed_json_does_not_poison_stream() {
        let mut parser = SseParser::new();
        let events = feed_all(
            &mut parser,
            &[b"data: {\"choices\":[\n", b"data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n"],
        );
        assert_eq!(events, vec![delta("ok")]);
    }

    #[test]
    fn test_overflow_is_bounded_and_recoverable() {
        let mut parser = SseParser::new();
        let big = "x".repeat(DEFAULT_DATA_CAPACITY + 1000);
        let oversized = format!(
            "data: {{\"choices\":[{{\"delta\":{{\"content\":\"{}\"}}}}]}}",
            big
        );

        let mut events = Vec::new();
        parser.feed(oversized.as_bytes(), |e| events.push(e));
        assert_eq!(parser.buffered(), DEFAULT_DATA_CAPACITY);

        parser.feed(b"\n\n", |e| events.push(e));
        assert!(events.is_empty());
        assert_eq!(parser.buffered(), 0);

        parser.feed(
            b"data: {\"choices\":[{\"delta\":{\"content\":\"after\"}}]}\n",
            |e| events.push(e),
        );
        assert_eq!(events, vec![delta("after")]);
    }

    #[test]
    fn test_small_capacity_truncates_sentinel() {
        let mut parser = SseParser::with_capacity(4);
        let events = feed_all(&mut parser, &[b"data: [DONE]\n"]);
        // "[DON" is neither the sentinel nor JSON
        assert!(events.is_empty());
        assert_eq!(parser.data_capacity(), 4);
    }

    #[test]
    fn test_reset_matches_fresh_parser() {
        let message: &[u8] = b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n";

        let mut used = SseParser::new();
        used.feed(b"data: {\"choices\":[{\"delta\":{\"cont", |_| {});
        assert_eq!(used.state(), ParserState::Value);
        used.reset();
        assert_eq!(used.state(), ParserState::Idle);
        assert_eq!(used.buffered(), 0);

        let mut fresh = SseParser::new();

        assert_eq!(feed_all(&mut used, &[message]), feed_all(&mut fresh, &[message]));
    }

    #[test]
    fn test_reset_mid_field() {
        let mut parser = SseParser::new();
        parser.feed(b"dat", |_| {});
        assert_eq!(parser.state(), ParserState::Field);
        parser.reset();

        // "a: [DONE]" would otherwise complete a field named "data"
        let events = feed_all(&mut parser, &[b"a: [DONE]\n"]);
        assert!(events.is_empty());
    }

    #[test]
    fn test_eol_lookahead_at_chunk_boundary() {
        let mut parser = SseParser::new();
        let mut events = Vec::new();

        parser.feed(b"data: [DONE]\r\n", |e| events.push(e));
        assert_eq!(parser.state(), ParserState::Eol);

        // First byte of the next line arrives alone
        parser.feed(b"d", |e| events.push(e));
        assert_eq!(parser.state(), ParserState::Field);

        parser.feed(b"ata: [DONE]\n", |e| events.push(e));
        assert_eq!(events, vec![StreamEvent::Done, StreamEvent::Done]);
    }

    #[test]
    fn test_empty_data_value() {
        let mut parser = SseParser::new();
        let events = feed_all(&mut parser, &[b"data:\ndata: [DONE]\n"]);
        assert_eq!(events, vec![StreamEvent::Done]);
    }

    #[test]
    fn test_stream_event_helpers() {
        assert!(StreamEvent::Done.is_done());
        assert_eq!(StreamEvent::Done.text(), None);
        assert!(!delta("x").is_done());
    }
}
