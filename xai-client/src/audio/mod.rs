/// PCM audio decoding for realtime voice output
pub mod pcm;

// Re-export commonly used types
pub use pcm::{PcmDecoder, PcmError, DEFAULT_PCM_BUFFER_BYTES};
