/// Response types for a non-streaming `POST /chat/completions`
///
/// The wire body is decoded leniently: every field the caller does not need
/// to be present is optional, and only the first choice is read.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Token usage reported by the API
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    /// Tokens in the prompt
    #[serde(default)]
    pub prompt_tokens: u32,
    /// Tokens generated
    #[serde(default)]
    pub completion_tokens: u32,
    /// Prompt plus completion
    #[serde(default)]
    pub total_tokens: u32,
}

/// A tool call requested by the model
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolCall {
    /// Call identifier, echoed back in the tool result
    pub id: Option<String>,
    /// Function name
    pub name: Option<String>,
    /// Arguments as a JSON string
    pub arguments: Option<String>,
}

/// Decoded chat completion
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ChatResponse {
    /// Model that answered
    pub model: Option<String>,
    /// Answer text
    pub content: Option<String>,
    /// Reasoning trace (reasoning models only)
    pub reasoning_content: Option<String>,
    /// `stop`, `length`, `tool_calls`, ...
    pub finish_reason: Option<String>,
    /// Token usage; zero when the API omits it
    pub usage: Usage,
    /// Tool calls from the first choice
    pub tool_calls: Vec<ToolCall>,
    /// Source URLs when search grounding was used
    pub citations: Vec<String>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct CompletionBody {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    usage: Option<Usage>,
    #[serde(default)]
    citations: Vec<Value>,
    #[serde(default)]
    pub(crate) error: Option<Value>,
}

#[derive(Deserialize, Debug)]
struct CompletionChoice {
    #[serde(default)]
    message: Option<CompletionMessage>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Deserialize, Debug)]
struct WireToolCall {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<WireFunction>,
}

#[derive(Deserialize, Debug)]
struct WireFunction {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

impl CompletionBody {
    /// Convert into a [`ChatResponse`]
    ///
    /// Returns `None` when the body carries no choices.
    pub(crate) fn into_response(self) -> Option<ChatResponse> {
        let choice = self.choices.into_iter().next()?;
        let message = choice.message;

        let (content, reasoning_content, tool_calls) = match message {
            Some(message) => (
                message.content,
                message.reasoning_content,
                message
                    .tool_calls
                    .into_iter()
                    .map(|call| {
                        let (name, arguments) = call
                            .function
                            .map(|f| (f.name, f.arguments))
                            .unwrap_or_default();
                        ToolCall {
                            id: call.id,
                            name,
                            arguments,
                        }
                    })
                    .collect(),
            ),
            None => (None, None, Vec::new()),
        };

        // Citations arrive as plain URL strings; older bodies used objects with a `url` field
        let citations = self
            .citations
            .into_iter()
            .filter_map(|citation| match citation {
                Value::String(url) => Some(url),
                Value::Object(map) => map.get("url").and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .collect();

        Some(ChatResponse {
            model: self.model,
            content,
            reasoning_content,
            finish_reason: choice.finish_reason,
            usage: self.usage.unwrap_or_default(),
            tool_calls,
            citations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> Option<ChatResponse> {
        serde_json::from_str::<CompletionBody>(json).unwrap().into_response()
    }

    #[test]
    fn test_full_body() {
        let response = decode(
            r#"{
                "id": "chatcmpl-1",
                "model": "grok-4",
                "choices": [{
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": "42",
                        "reasoning_content": "thinking..."
                    },
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 10, "completion_tokens": 2, "total_tokens": 12},
                "citations": ["https://x.ai", {"url": "https://docs.x.ai"}, 7]
            }"#,
        )
        .unwrap();

        assert_eq!(response.model.as_deref(), Some("grok-4"));
        assert_eq!(response.content.as_deref(), Some("42"));
        assert_eq!(response.reasoning_content.as_deref(), Some("thinking..."));
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
        assert_eq!(
            response.usage,
            Usage {
                prompt_tokens: 10,
                completion_tokens: 2,
                total_tokens: 12
            }
        );
        assert_eq!(response.citations, vec!["https://x.ai", "https://docs.x.ai"]);
    }

    #[test]
    fn test_tool_calls() {
        let response = decode(
            r#"{"choices":[{"message":{"content":null,"tool_calls":[
                {"id":"call_1","type":"function","function":{"name":"get_weather","arguments":"{\"city\":\"Oslo\"}"}}
            ]},"finish_reason":"tool_calls"}]}"#,
        )
        .unwrap();

        assert!(response.content.is_none());
        assert_eq!(response.finish_reason.as_deref(), Some("tool_calls"));
        assert_eq!(
            response.tool_calls,
            vec![ToolCall {
                id: Some("call_1".to_string()),
                name: Some("get_weather".to_string()),
                arguments: Some(r#"{"city":"Oslo"}"#.to_string()),
            }]
        );
    }

    #[test]
    fn test_missing_usage_defaults_to_zero() {
        let response = decode(r#"{"choices":[{"message":{"content":"hi"}}]}"#).unwrap();
        assert_eq!(response.usage, Usage::default());
        assert!(response.finish_reason.is_none());
    }

    #[test]
    fn test_no_choices() {
        assert!(decode(r#"{"choices":[]}"#).is_none());
        assert!(decode(r#"{"id":"x"}"#).is_none());
    }
}
