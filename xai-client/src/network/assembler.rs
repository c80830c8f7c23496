/// Reassembly of fragmented WebSocket TEXT payloads
///
/// A realtime session may deliver one logical JSON message as several
/// fragments, each addressed by its offset into the full payload. The
/// assembler copies them into a fixed-capacity buffer owned by the caller and
/// reports when the message is complete.
///
/// Only TEXT-opcode data may be fed here. Control frames (PING/PONG/CLOSE)
/// are indistinguishable from data at this layer and must be filtered
/// upstream.
///
/// Completeness is judged by a high-water mark (largest `offset + len`
/// written), not by exact byte coverage: a message whose fragments skip an
/// interior range is still reported complete once the last fragment lands.

use tracing::{debug, warn};

/// One delivery unit of a multi-part message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment<'a> {
    /// Total logical size of the message; only meaningful when `payload_offset == 0`
    pub payload_len: usize,

    /// Offset of `data` within the message
    pub payload_offset: usize,

    /// Bytes carried by this fragment
    pub data: &'a [u8],

    /// Final fragment of the message
    pub fin: bool,
}

impl<'a> Fragment<'a> {
    /// Create a fragment descriptor
    pub fn new(payload_len: usize, payload_offset: usize, data: &'a [u8], fin: bool) -> Self {
        Self {
            payload_len,
            payload_offset,
            data,
            fin,
        }
    }

    /// A whole message delivered in a single fragment
    ///
    /// # Example
    /// ```
    /// use xai_client::network::assembler::Fragment;
    ///
    /// let fragment = Fragment::whole(b"{\"type\":\"response.done\"}");
    /// assert_eq!(fragment.payload_len, 24);
    /// assert!(fragment.fin);
    /// ```
    pub fn whole(data: &'a [u8]) -> Self {
        Self::new(data.len(), 0, data, true)
    }

    /// End offset of this fragment, `None` on overflow
    pub fn end(&self) -> Option<usize> {
        self.payload_offset.checked_add(self.data.len())
    }
}

/// Fixed-capacity WebSocket payload assembler
///
/// The backing buffer is supplied by the caller (`Vec<u8>`, `Box<[u8]>`,
/// `&mut [u8]`, an array); its length is the hard capacity limit.
///
/// # Example
/// ```
/// use xai_client::network::assembler::{Fragment, WsAssembler};
///
/// let mut assembler = WsAssembler::new(vec![0u8; 64]);
///
/// assert!(!assembler.feed_fragment(&Fragment::new(11, 0, b"hello", false)));
/// assert!(assembler.feed_fragment(&Fragment::new(11, 5, b" world", true)));
/// assert_eq!(assembler.message(), Some(&b"hello world"[..]));
/// ```
#[derive(Debug)]
pub struct WsAssembler<B> {
    buffer: B,

    /// Declared total length of the message in progress
    expected_length: usize,

    /// Largest `offset + len` written for the current message
    high_water_mark: usize,

    in_progress: bool,

    /// The last fed fragment completed a message
    complete: bool,
}

impl<B> WsAssembler<B>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    /// Create an assembler over a caller-owned buffer
    pub fn new(buffer: B) -> Self {
        Self {
            buffer,
            expected_length: 0,
            high_water_mark: 0,
            in_progress: false,
            complete: false,
        }
    }

    /// Feed one fragment
    ///
    /// # Returns
    /// `true` exactly when this call completes a message; the message is then
    /// available through [`WsAssembler::message`].
    pub fn feed_fragment(&mut self, fragment: &Fragment<'_>) -> bool {
        if fragment.data.is_empty() {
            debug!("Ignoring empty fragment");
            return false;
        }

        if fragment.payload_offset == 0 {
            if fragment.payload_len == 0 || fragment.payload_len > self.capacity() {
                warn!(
                    payload_len = fragment.payload_len,
                    capacity = self.capacity(),
                    "Rejecting message that cannot fit the assembly buffer"
                );
                self.reset();
                return false;
            }

            self.expected_length = fragment.payload_len;
            self.high_water_mark = 0;
            self.in_progress = true;
            self.complete = false;
        } else if !self.in_progress {
            debug!(
                offset = fragment.payload_offset,
                "Dropping continuation fragment without a message start"
            );
            return false;
        }

        let end = match fragment.end() {
            Some(end) if end <= self.capacity() => end,
            _ => {
                warn!(
                    offset = fragment.payload_offset,
                    len = fragment.data.len(),
                    capacity = self.capacity(),
                    "Fragment exceeds assembly buffer, resetting"
                );
                self.reset();
                return false;
            }
        };

        self.buffer.as_mut()[fragment.payload_offset..end].copy_from_slice(fragment.data);
        self.high_water_mark = self.high_water_mark.max(end);

        if fragment.fin && self.expected_length > 0 && self.high_water_mark == self.expected_length
        {
            debug!(len = self.expected_length, "Message assembled");
            self.in_progress = false;
            self.complete = true;
            return true;
        }

        false
    }

    /// Discard any message in progress
    pub fn reset(&mut self) {
        self.expected_length = 0;
        self.high_water_mark = 0;
        self.in_progress = false;
        self.complete = false;
    }

    /// The completed message, if the last fragment completed one
    pub fn message(&self) -> Option<&[u8]> {
        if self.complete {
            Some(&self.buffer.as_ref()[..self.expected_length])
        } else {
            None
        }
    }

    /// Capacity of the backing buffer
    pub fn capacity(&self) -> usize {
        self.buffer.as_ref().len()
    }

    /// Declared length of the current (or last completed) message
    pub fn expected_length(&self) -> usize {
        self.expected_length
    }

    /// Largest `offset + len` written for the current message
    pub fn high_water_mark(&self) -> usize {
        self.high_water_mark
    }

    /// Check if a message is partially assembled
    pub fn is_in_progress(&self) -> bool {
        self.in_progress
    }

    /// Raw access to the backing buffer
    pub fn buffer(&self) -> &[u8] {
        self.buffer.as_ref()
    }

    /// Consume the assembler and return the backing buffer
    pub fn into_inner(self) -> B {
        self.buffer
    }
}
