//! 全局错误处理模块
//!
//! 提供统一的客户端错误类型和用户友好的错误消息
//!
//! # 功能
//!
//! - 统一的 `AppError` 类型，聚合所有模块错误
//! - 稳定的错误代码，便于调用方分支处理
//! - 错误恢复建议
//!
//! # 使用示例
//!
//! ```
//! use xai_client::network::NetworkError;
//! use xai_client::utils::error::{AppError, ErrorCode};
//!
//! let err: AppError = NetworkError::TurnInProgress.into();
//! assert_eq!(err.code(), ErrorCode::NetworkBusy);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audio::PcmError;
use crate::chat::ChatError;
use crate::config::ConfigError;
use crate::network::error::NetworkError;

/// 应用错误类型
///
/// 聚合所有模块的错误类型，提供统一的错误处理接口
#[derive(Error, Debug)]
pub enum AppError {
    /// 实时语音网络错误
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// 流式对话错误
    #[error("Chat error: {0}")]
    Chat(#[from] ChatError),

    /// 配置错误
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// 音频解码错误
    #[error("Audio error: {0}")]
    Pcm(#[from] PcmError),

    /// 内部错误
    #[error("Internal error: {0}")]
    Internal(String),
}

/// 错误代码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // 网络错误
    /// 连接失败
    NetworkConnectionFailed,
    /// 认证失败（API Key 无效）
    NetworkAuthFailed,
    /// 协议或序列化错误
    NetworkProtocolError,
    /// 连接超时
    NetworkTimeout,
    /// 未连接或会话尚未就绪
    NetworkNotReady,
    /// 上一轮回复尚未结束
    NetworkBusy,

    // 对话错误
    /// 认证失败
    ChatAuthFailed,
    /// 请求过于频繁
    ChatRateLimited,
    /// 服务端返回错误状态
    ChatApiError,
    /// 客户端正忙
    ChatBusy,
    /// HTTP 传输失败
    ChatHttpError,
    /// 参数无效
    ChatInvalidArgument,
    /// 响应无法解析
    ChatInvalidResponse,

    // 音频错误
    /// 音频解码失败
    AudioDecodeFailed,

    // 配置错误
    /// 配置加载失败
    ConfigLoadFailed,
    /// 配置无效
    ConfigInvalid,

    // 通用错误
    /// 内部错误
    InternalError,
}

/// 错误上下文信息
///
/// 提供用户友好的错误信息和恢复建议
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// 错误代码
    pub code: ErrorCode,
    /// 用户友好的错误消息
    pub message: String,
    /// 详细错误信息（用于日志）
    pub detail: Option<String>,
    /// 恢复建议
    pub recovery_hint: Option<String>,
    /// 是否可恢复
    pub recoverable: bool,
}

impl ErrorContext {
    /// 创建新的错误上下文
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            detail: None,
            recovery_hint: None,
            recoverable: true,
        }
    }

    /// 设置详细信息
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// 设置恢复建议
    pub fn with_recovery_hint(mut self, hint: impl Into<String>) -> Self {
        self.recovery_hint = Some(hint.into());
        self
    }

    /// 标记为不可恢复
    pub fn not_recoverable(mut self) -> Self {
        self.recoverable = false;
        self
    }
}

impl AppError {
    /// 获取错误代码
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Network(NetworkError::ConnectionFailed(_)) => ErrorCode::NetworkConnectionFailed,
            AppError::Network(NetworkError::AuthenticationFailed) => ErrorCode::NetworkAuthFailed,
            AppError::Network(NetworkError::Timeout(_)) => ErrorCode::NetworkTimeout,
            AppError::Network(NetworkError::WebSocketError(_))
            | AppError::Network(NetworkError::SerializationError(_)) => ErrorCode::NetworkProtocolError,
            AppError::Network(NetworkError::NotConnected)
            | AppError::Network(NetworkError::SessionNotReady) => ErrorCode::NetworkNotReady,
            AppError::Network(NetworkError::TurnInProgress) => ErrorCode::NetworkBusy,
            AppError::Network(NetworkError::InvalidConfig(_)) => ErrorCode::ConfigInvalid,
            AppError::Network(_) => ErrorCode::NetworkConnectionFailed,

            AppError::Chat(ChatError::AuthFailed) => ErrorCode::ChatAuthFailed,
            AppError::Chat(ChatError::RateLimited) => ErrorCode::ChatRateLimited,
            AppError::Chat(ChatError::Api { .. }) => ErrorCode::ChatApiError,
            AppError::Chat(ChatError::Busy(_)) => ErrorCode::ChatBusy,
            AppError::Chat(ChatError::Http(_)) => ErrorCode::ChatHttpError,
            AppError::Chat(ChatError::InvalidArgument(_)) => ErrorCode::ChatInvalidArgument,
            AppError::Chat(ChatError::Serialization(_))
            | AppError::Chat(ChatError::InvalidResponse(_)) => ErrorCode::ChatInvalidResponse,

            AppError::Pcm(_) => ErrorCode::AudioDecodeFailed,

            AppError::Config(ConfigError::Io(_)) => ErrorCode::ConfigLoadFailed,
            AppError::Config(_) => ErrorCode::ConfigInvalid,

            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// 获取用户友好的错误消息
    pub fn user_message(&self) -> String {
        match self {
            AppError::Network(NetworkError::AuthenticationFailed)
            | AppError::Chat(ChatError::AuthFailed) => "API Key 无效，请检查配置".to_string(),
            AppError::Network(NetworkError::Timeout(_)) => {
                "连接超时，请检查网络状况".to_string()
            }
            AppError::Network(NetworkError::SessionNotReady) => {
                "语音会话尚未就绪，请稍后再试".to_string()
            }
            AppError::Network(NetworkError::TurnInProgress) => {
                "上一轮回复尚未结束".to_string()
            }
            AppError::Network(NetworkError::ConnectionClosed)
            | AppError::Network(NetworkError::NotConnected) => "连接已断开，请重试".to_string(),
            AppError::Network(_) => "网络错误，请检查网络连接".to_string(),

            AppError::Chat(ChatError::RateLimited) => "请求过于频繁，请稍后再试".to_string(),
            AppError::Chat(ChatError::Api { status, .. }) => {
                format!("服务端返回错误 ({})", status)
            }
            AppError::Chat(ChatError::Busy(_)) => "已有请求正在进行".to_string(),
            AppError::Chat(_) => "对话请求失败，请重试".to_string(),

            AppError::Pcm(_) => "音频数据解码失败".to_string(),

            AppError::Config(ConfigError::Io(_)) => "无法读取配置文件".to_string(),
            AppError::Config(ConfigError::Json(_)) => "配置文件格式错误".to_string(),
            AppError::Config(_) => "配置错误".to_string(),

            AppError::Internal(msg) => format!("内部错误: {}", msg),
        }
    }

    /// 获取完整的错误上下文
    pub fn context(&self) -> ErrorContext {
        let mut ctx = ErrorContext::new(self.code(), self.user_message())
            .with_detail(self.to_string());

        ctx.recovery_hint = self.recovery_hint();

        if !self.is_recoverable() {
            ctx = ctx.not_recoverable();
        }

        ctx
    }

    /// 获取恢复建议
    pub fn recovery_hint(&self) -> Option<String> {
        match self {
            AppError::Network(NetworkError::AuthenticationFailed)
            | AppError::Chat(ChatError::AuthFailed) => {
                Some("请设置正确的 XAI_API_KEY".to_string())
            }
            AppError::Network(NetworkError::SessionNotReady) => {
                Some("等待 session.updated 后再发送，或开启 queue_turn_before_ready".to_string())
            }
            AppError::Chat(ChatError::RateLimited) => Some("请降低请求频率".to_string()),
            _ => None,
        }
    }

    /// 检查错误是否可恢复
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, AppError::Config(_) | AppError::Internal(_))
    }

    /// 检查是否是认证错误
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            AppError::Network(NetworkError::AuthenticationFailed) | AppError::Chat(ChatError::AuthFailed)
        )
    }
}

/// 应用结果类型
pub type AppResult<T> = Result<T, AppError>;

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Internal(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }
}
