//! 客户端配置模块
//!
//! 提供客户端配置的加载、保存和校验功能
//!
//! # 配置来源
//!
//! - JSON 配置文件（缺失字段使用默认值）
//! - 环境变量 `XAI_API_KEY`、`XAI_BASE_URL`、`XAI_MODEL`（覆盖文件中的值）
//!
//! # 使用示例
//!
//! ```no_run
//! use xai_client::config::{ClientConfig, ConfigManager};
//!
//! let config = ConfigManager::load("xai.json")
//!     .unwrap()
//!     .with_env_overrides();
//! config.validate().unwrap();
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audio::DEFAULT_PCM_BUFFER_BYTES;
use crate::stream::DEFAULT_DATA_CAPACITY;

/// 默认 API 地址
pub const DEFAULT_BASE_URL: &str = "https://api.x.ai/v1";

/// 默认模型
pub const DEFAULT_MODEL: &str = "grok-3-latest";

/// 默认实时语音地址
pub const DEFAULT_VOICE_URI: &str = "wss://api.x.ai/v1/realtime";

/// 单条实时消息的默认最大长度（256 KiB）
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 256 * 1024;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 序列化/反序列化错误
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// 配置无效
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// 配置结果类型
pub type ConfigResult<T> = Result<T, ConfigError>;

/// 客户端配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API 配置
    pub api: ApiConfig,
    /// 流式对话配置
    pub stream: StreamConfig,
    /// 实时语音配置
    pub voice: VoiceConfig,
}

/// API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// xAI API 密钥
    pub api_key: String,
    /// API 地址
    pub base_url: String,
    /// 默认模型
    pub model: String,
    /// 请求超时（毫秒）
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_ms: 60_000,
        }
    }
}

/// 流式对话配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// SSE `data:` 缓冲区容量（字节）
    pub data_buffer_capacity: usize,
    /// 等待上一个请求结束的最长时间（毫秒）
    pub lock_timeout_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            data_buffer_capacity: DEFAULT_DATA_CAPACITY,
            lock_timeout_ms: 5_000,
        }
    }
}

/// 实时语音配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// WebSocket 地址
    pub uri: String,
    /// xAI API 密钥（为空时使用 `api.api_key`）
    pub api_key: String,
    /// 网络超时（毫秒）
    pub network_timeout_ms: u64,
    /// 断开连接时等待会话任务结束的超时（毫秒）
    pub close_timeout_ms: u64,
    /// 单条 JSON 消息最大长度，即重组缓冲区大小（字节）
    pub max_message_size: usize,
    /// PCM 解码缓冲区大小（字节）
    pub pcm_buffer_bytes: usize,
    /// 会话就绪前是否缓存一条文本轮次
    pub queue_turn_before_ready: bool,
    /// 连接后发送的会话设置
    pub session: VoiceSessionConfig,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_VOICE_URI.to_string(),
            api_key: String::new(),
            network_timeout_ms: 60_000,
            close_timeout_ms: 15_000,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            pcm_buffer_bytes: DEFAULT_PCM_BUFFER_BYTES,
            queue_turn_before_ready: false,
            session: VoiceSessionConfig::default(),
        }
    }
}

/// 语音会话设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceSessionConfig {
    /// 音色名称
    pub voice: String,
    /// 系统指令
    pub instructions: String,
    /// 输入/输出采样率（Hz）
    pub sample_rate_hz: u32,
    /// 是否启用服务端 VAD（否则为文本轮次）
    pub server_vad: bool,
}

impl Default for VoiceSessionConfig {
    fn default() -> Self {
        Self {
            voice: "Ara".to_string(),
            instructions: "You are a helpful assistant.".to_string(),
            sample_rate_hz: 24_000,
            server_vad: false,
        }
    }
}

impl ClientConfig {
    /// 使用指定 API 密钥创建默认配置
    pub fn new(api_key: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.api.api_key = api_key.into();
        config
    }

    /// 应用环境变量覆盖
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var("XAI_API_KEY") {
            if !key.is_empty() {
                self.api.api_key = key;
            }
        }
        if let Ok(url) = std::env::var("XAI_BASE_URL") {
            if !url.is_empty() {
                self.api.base_url = url;
            }
        }
        if let Ok(model) = std::env::var("XAI_MODEL") {
            if !model.is_empty() {
                self.api.model = model;
            }
        }
        self
    }

    /// 实时语音使用的 API 密钥
    pub fn voice_api_key(&self) -> &str {
        if self.voice.api_key.is_empty() {
            &self.api.api_key
        } else {
            &self.voice.api_key
        }
    }

    /// 校验配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.api.api_key.is_empty() && self.voice.api_key.is_empty() {
            return Err(ConfigError::Invalid("API key is required".to_string()));
        }
        if self.api.base_url.is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".to_string()));
        }
        if self.stream.data_buffer_capacity == 0 {
            return Err(ConfigError::Invalid(
                "stream.data_buffer_capacity must be greater than 0".to_string(),
            ));
        }
        if self.voice.max_message_size == 0 {
            return Err(ConfigError::Invalid(
                "voice.max_message_size must be greater than 0".to_string(),
            ));
        }
        if self.voice.pcm_buffer_bytes < 2 {
            return Err(ConfigError::Invalid(
                "voice.pcm_buffer_bytes must hold at least one sample".to_string(),
            ));
        }
        if self.voice.session.sample_rate_hz == 0 {
            return Err(ConfigError::Invalid(
                "voice.session.sample_rate_hz must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// 配置管理器
///
/// 提供配置文件的加载与保存
pub struct ConfigManager;

impl ConfigManager {
    /// 加载配置
    ///
    /// 文件不存在时返回默认配置
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<ClientConfig> {
        let path = path.as_ref();

        tracing::debug!(path = %path.display(), "Loading config");

        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: ClientConfig = serde_json::from_str(&content)?;
            tracing::info!(path = %path.display(), "Config loaded successfully");
            Ok(config)
        } else {
            tracing::info!("Config file not found, using defaults");
            Ok(ClientConfig::default())
        }
    }

    /// 保存配置
    pub fn save(path: impl AsRef<Path>, config: &ClientConfig) -> ConfigResult<()> {
        let path = path.as_ref();

        tracing::debug!(path = %path.display(), "Saving config");

        // 确保目录存在
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(config)?;
        std::fs::write(path, content)?;

        tracing::info!(path = %path.display(), "Config saved successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();

        assert!(config.api.api_key.is_empty());
        assert_eq!(config.api.base_url, "https://api.x.ai/v1");
        assert_eq!(config.api.model, "grok-3-latest");
        assert_eq!(config.api.timeout_ms, 60_000);

        assert_eq!(config.stream.data_buffer_capacity, 8192);

        assert_eq!(config.voice.uri, "wss://api.x.ai/v1/realtime");
        assert_eq!(config.voice.max_message_size, 256 * 1024);
        assert_eq!(config.voice.pcm_buffer_bytes, 64 * 1024);
        assert_eq!(config.voice.close_timeout_ms, 15_000);
        assert!(!config.voice.queue_turn_before_ready);
    }

    #[test]
    fn test_voice_session_default() {
        let session = VoiceSessionConfig::default();

        assert_eq!(session.voice, "Ara");
        assert_eq!(session.instructions, "You are a helpful assistant.");
        assert_eq!(session.sample_rate_hz, 24_000);
        assert!(!session.server_vad);
    }

    #[test]
    fn test_config_partial_json() {
        // 部分 JSON 使用默认值填充缺失字段
        let json = r#"{
            "api": { "api_key": "test-key" },
            "voice": { "session": { "voice": "Rex" } }
        }"#;

        let config: ClientConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.api.api_key, "test-key");
        assert_eq!(config.api.model, "grok-3-latest");
        assert_eq!(config.voice.session.voice, "Rex");
        assert_eq!(config.voice.session.sample_rate_hz, 24_000);
    }

    #[test]
    fn test_validate() {
        assert!(ClientConfig::default().validate().is_err());
        assert!(ClientConfig::new("key").validate().is_ok());

        let mut config = ClientConfig::new("key");
        config.stream.data_buffer_capacity = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = ClientConfig::new("key");
        config.voice.max_message_size = 0;
        assert!(config.validate().is_err());

        let mut config = ClientConfig::new("key");
        config.voice.pcm_buffer_bytes = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_voice_api_key_fallback() {
        let mut config = ClientConfig::new("main-key");
        assert_eq!(config.voice_api_key(), "main-key");

        config.voice.api_key = "voice-key".to_string();
        assert_eq!(config.voice_api_key(), "voice-key");
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigManager::load(dir.path().join("missing.json")).unwrap();
        assert_eq!(config.api.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("xai.json");

        let mut config = ClientConfig::new("saved-key");
        config.voice.session.server_vad = true;
        ConfigManager::save(&path, &config).unwrap();

        let loaded = ConfigManager::load(&path).unwrap();
        assert_eq!(loaded.api.api_key, "saved-key");
        assert!(loaded.voice.session.server_vad);
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "not json").unwrap();

        let err = ConfigManager::load(&path).unwrap_err();
        assert!(err.to_string().contains("JSON"));
    }
}
