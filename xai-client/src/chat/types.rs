/// Request types for the chat-completions endpoint
///
/// Only options the xAI endpoint accepts are carried; OpenAI-only knobs such
/// as penalties and stop sequences are rejected upstream with HTTP 400.

use serde::{Deserialize, Serialize};

/// Message author
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompt
    System,
    /// End user
    User,
    /// Model output
    Assistant,
}

/// One chat message
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatMessage {
    /// Author role
    pub role: Role,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// System message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// User message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Per-request options
///
/// # Example
/// ```
/// use xai_client::chat::ChatOptions;
///
/// let options = ChatOptions::default()
///     .with_model("grok-3-mini")
///     .with_temperature(0.2);
/// assert_eq!(options.model.as_deref(), Some("grok-3-mini"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatOptions {
    /// Model override; the configured model is used when `None`
    pub model: Option<String>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Output token limit
    pub max_tokens: Option<u32>,
    /// Nucleus sampling cutoff
    pub top_p: Option<f32>,
    /// `"low"` or `"high"` on reasoning models
    pub reasoning_effort: Option<String>,
    /// Allow the model to issue several tool calls at once
    pub parallel_tool_calls: bool,
}

impl ChatOptions {
    /// Override the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the output token limit
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set nucleus sampling
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Set the reasoning effort
    pub fn with_reasoning_effort(mut self, effort: impl Into<String>) -> Self {
        self.reasoning_effort = Some(effort.into());
        self
    }

    /// Allow parallel tool calls
    pub fn with_parallel_tool_calls(mut self, enabled: bool) -> Self {
        self.parallel_tool_calls = enabled;
        self
    }
}

/// Body of `POST /chat/completions`
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChatRequest<'a> {
    /// Model name
    pub model: &'a str,
    /// Conversation so far
    pub messages: &'a [ChatMessage],
    /// SSE response when `true`, one JSON body otherwise
    pub stream: bool,
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Output token limit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Nucleus sampling cutoff
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Reasoning effort
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<&'a str>,
    /// Only sent when enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel_tool_calls: Option<bool>,
}

impl<'a> ChatRequest<'a> {
    /// Build a request, falling back to `default_model` when no override is set
    pub fn new(
        default_model: &'a str,
        messages: &'a [ChatMessage],
        options: &'a ChatOptions,
        stream: bool,
    ) -> Self {
        Self {
            model: options.model.as_deref().unwrap_or(default_model),
            messages,
            stream,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            top_p: options.top_p,
            reasoning_effort: options.reasoning_effort.as_deref(),
            parallel_tool_calls: options.parallel_tool_calls.then_some(true),
        }
    }

    /// Build a streaming request
    pub fn streaming(
        default_model: &'a str,
        messages: &'a [ChatMessage],
        options: &'a ChatOptions,
    ) -> Self {
        Self::new(default_model, messages, options, true)
    }
}
