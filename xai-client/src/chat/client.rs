/// Chat-completions client
///
/// Streaming requests post `stream: true` and feed every body chunk, exactly
/// as received, into an `SseParser`. Non-streaming requests decode one JSON
/// body. One request runs at a time per client; the parser's data buffer is
/// reused across requests.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::chat::error::{ChatError, ChatResult};
use crate::chat::response::{ChatResponse, CompletionBody};
use crate::chat::types::{ChatMessage, ChatOptions, ChatRequest};
use crate::config::{ApiConfig, ClientConfig};
use crate::stream::{SseParser, StreamEvent};

/// Streaming chat client
///
/// # Example
/// ```no_run
/// use xai_client::chat::{ChatClient, ChatMessage, ChatOptions};
/// use xai_client::config::ClientConfig;
///
/// #[tokio::main]
/// async fn main() {
///     let client = ChatClient::new(&ClientConfig::new("xai-key")).unwrap();
///     let messages = [ChatMessage::user("Hello")];
///
///     client
///         .stream_chat(&messages, &ChatOptions::default(), |event| {
///             if let Some(text) = event.text() {
///                 print!("{}", text);
///             }
///         })
///         .await
///         .unwrap();
/// }
/// ```
pub struct ChatClient {
    http: reqwest::Client,
    api: ApiConfig,
    lock_timeout_ms: u64,
    parser: Mutex<SseParser>,
}

impl ChatClient {
    /// Create a client from configuration
    ///
    /// # Errors
    /// `InvalidArgument` if the API key or base URL is empty
    pub fn new(config: &ClientConfig) -> ChatResult<Self> {
        if config.api.api_key.is_empty() {
            return Err(ChatError::InvalidArgument("API key is empty".to_string()));
        }
        if config.api.base_url.is_empty() {
            return Err(ChatError::InvalidArgument("base URL is empty".to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.api.timeout_ms))
            .build()?;

        Ok(Self {
            http,
            api: config.api.clone(),
            lock_timeout_ms: config.stream.lock_timeout_ms,
            parser: Mutex::new(SseParser::with_capacity(config.stream.data_buffer_capacity)),
        })
    }

    /// Endpoint for chat completions
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api.base_url.trim_end_matches('/'))
    }

    /// Stream a chat completion
    ///
    /// `on_event` receives every content delta in order, then `Done` for each
    /// end signal in the stream. Returns when the response body ends.
    ///
    /// # Errors
    /// * `InvalidArgument` - `messages` is empty
    /// * `Busy` - another request held the client past the lock timeout
    /// * `AuthFailed` / `RateLimited` / `Api` - non-success status
    /// * `Http` - transport failure, including mid-body
    pub async fn stream_chat<F>(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
        mut on_event: F,
    ) -> ChatResult<()>
    where
        F: FnMut(StreamEvent),
    {
        if messages.is_empty() {
            return Err(ChatError::InvalidArgument("messages must not be empty".to_string()));
        }

        let mut parser = self.acquire().await?;
        parser.reset();

        let request = ChatRequest::streaming(&self.api.model, messages, options);
        info!(model = request.model, messages = messages.len(), "Starting chat stream");

        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.api.api_key)
            .header("Accept", "text/event-stream")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Chat request failed");
            return Err(ChatError::from_status(status, body));
        }

        let mut body = response.bytes_stream();
        let mut chunk_count = 0u64;

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            chunk_count += 1;
            debug!("Chunk #{}: {} bytes", chunk_count, chunk.len());

            parser.feed(&chunk, &mut on_event);
        }

        info!("Chat stream finished: {} chunks", chunk_count);
        Ok(())
    }

    /// Run a non-streaming chat completion
    ///
    /// Returns the first choice with its finish reason, usage, reasoning
    /// content, tool calls and citations.
    ///
    /// # Errors
    /// * `InvalidArgument` - `messages` is empty
    /// * `Busy` - another request held the client past the lock timeout
    /// * `AuthFailed` / `RateLimited` / `Api` - non-success status, or an
    ///   `error` object in a success body
    /// * `Serialization` - body is not JSON of the expected shape
    /// * `InvalidResponse` - body has no choices
    pub async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> ChatResult<ChatResponse> {
        if messages.is_empty() {
            return Err(ChatError::InvalidArgument("messages must not be empty".to_string()));
        }

        let _guard = self.acquire().await?;

        let request = ChatRequest::new(&self.api.model, messages, options, false);
        info!(model = request.model, messages = messages.len(), "Starting chat completion");

        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.api.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "Chat request failed");
            return Err(ChatError::from_status(
                status,
                String::from_utf8_lossy(&bytes).into_owned(),
            ));
        }

        let body: CompletionBody = serde_json::from_slice(&bytes)?;
        if let Some(error) = &body.error {
            warn!("Chat completion carried an error object: {}", error);
            return Err(ChatError::Api {
                status: status.as_u16(),
                body: error.to_string(),
            });
        }

        let response = body
            .into_response()
            .ok_or_else(|| ChatError::InvalidResponse("no choices in response".to_string()))?;

        debug!(
            finish_reason = ?response.finish_reason,
            total_tokens = response.usage.total_tokens,
            "Chat completion finished"
        );
        Ok(response)
    }

    /// Stream a chat completion and collect the text
    ///
    /// # Returns
    /// The concatenated deltas and whether an end signal was seen
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> ChatResult<(String, bool)> {
        let mut text = String::new();
        let mut finished = false;

        self.stream_chat(messages, options, |event| match event {
            StreamEvent::Delta(delta) => text.push_str(&delta),
            StreamEvent::Done => finished = true,
        })
        .await?;

        Ok((text, finished))
    }

    /// Take the per-client request slot, waiting at most the lock timeout
    async fn acquire(&self) -> ChatResult<MutexGuard<'_, SseParser>> {
        tokio::time::timeout(
            Duration::from_millis(self.lock_timeout_ms),
            self.parser.lock(),
        )
        .await
        .map_err(|_| ChatError::Busy(self.lock_timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_api_key() {
        let result = ChatClient::new(&ClientConfig::default());
        assert!(matches!(result, Err(ChatError::InvalidArgument(_))));
    }

    #[test]
    fn test_completions_url() {
        let mut config = ClientConfig::new("key");
        config.api.base_url = "http://localhost:8080/v1/".to_string();

        let client = ChatClient::new(&config).unwrap();
        assert_eq!(client.completions_url(), "http://localhost:8080/v1/chat/completions");
    }

    #[tokio::test]
    async fn test_empty_messages_rejected() {
        let client = ChatClient::new(&ClientConfig::new("key")).unwrap();
        let result = client.stream_chat(&[], &ChatOptions::default(), |_| {}).await;

        assert!(matches!(result, Err(ChatError::InvalidArgument(_))));
    }
}
