//! PCM 解码缓冲区模块
//!
//! 将服务端下发的 Base64 音频增量解码为 i16 PCM 样本
//!
//! # 特性
//!
//! - 预分配固定容量，解码路径上不做内存分配
//! - 超出容量的音频块直接报错，不截断
//!
//! # 使用示例
//!
//! ```
//! use xai_client::audio::pcm::PcmDecoder;
//!
//! // 64 字节 = 32 个样本
//! let mut decoder = PcmDecoder::new(64);
//!
//! // 两个样本: 1, -1 (小端)
//! let samples = decoder.decode("AQD//w==").unwrap();
//! assert_eq!(samples, &[1, -1]);
//! ```

use base64::{engine::general_purpose::STANDARD, DecodeSliceError, Engine};
use thiserror::Error;

/// 默认 PCM 缓冲区大小（64 KiB）
pub const DEFAULT_PCM_BUFFER_BYTES: usize = 64 * 1024;

/// PCM 解码错误
#[derive(Error, Debug)]
pub enum PcmError {
    /// Base64 解码失败（包括输出缓冲区不足）
    #[error("base64 decode failed: {0}")]
    Base64(#[from] DecodeSliceError),

    /// 字节数为奇数，无法组成 16 位样本
    #[error("pcm16 odd bytecount: {0}")]
    OddByteCount(usize),
}

impl PcmError {
    /// 上报给状态回调的简短描述
    pub fn state_detail(&self) -> &'static str {
        match self {
            PcmError::Base64(_) => "base64 decode failed",
            PcmError::OddByteCount(_) => "pcm16 odd bytecount",
        }
    }
}

/// 可重用的 PCM 解码缓冲区
///
/// 字节缓冲区与样本缓冲区在创建时一次性分配
pub struct PcmDecoder {
    /// Base64 解码后的原始字节
    bytes: Box<[u8]>,
    /// i16 样本
    samples: Box<[i16]>,
}

impl PcmDecoder {
    /// 创建新的解码缓冲区
    ///
    /// # Arguments
    ///
    /// * `buffer_bytes` - 单次音频增量解码后的最大字节数
    pub fn new(buffer_bytes: usize) -> Self {
        Self {
            bytes: vec![0u8; buffer_bytes].into_boxed_slice(),
            samples: vec![0i16; buffer_bytes / 2].into_boxed_slice(),
        }
    }

    /// 解码一段 Base64 音频
    ///
    /// # Returns
    ///
    /// 返回解码得到的样本切片，仅在下一次解码前有效
    pub fn decode(&mut self, base64: &str) -> Result<&[i16], PcmError> {
        let len = STANDARD.decode_slice(base64.as_bytes(), &mut self.bytes)?;

        if len % 2 != 0 {
            return Err(PcmError::OddByteCount(len));
        }

        let count = len / 2;
        for (sample, pair) in self.samples[..count]
            .iter_mut()
            .zip(self.bytes[..len].chunks_exact(2))
        {
            *sample = i16::from_le_bytes([pair[0], pair[1]]);
        }

        Ok(&self.samples[..count])
    }

    /// 获取字节容量
    pub fn capacity_bytes(&self) -> usize {
        self.bytes.len()
    }
}

impl Default for PcmDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_PCM_BUFFER_BYTES)
    }
}
