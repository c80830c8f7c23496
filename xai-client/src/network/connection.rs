/// WebSocket connection to the xAI realtime voice API
///
/// This module opens the authenticated WebSocket used by the voice client.

use crate::config::VoiceConfig;
use crate::network::error::{NetworkError, NetworkResult};
use crate::network::messages::ClientEvent;
use futures_util::{
    stream::{SplitSink, SplitStream},
    Sink, SinkExt, StreamExt,
};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        client::IntoClientRequest,
        http::{header::AUTHORIZATION, HeaderValue},
        Message,
    },
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Write half of the WebSocket stream
pub type WsWriter = SplitSink<WsStream, Message>;

/// Read half of the WebSocket stream
pub type WsReader = SplitStream<WsStream>;

/// Configuration for the WebSocket connection
///
/// # Example
/// ```
/// use xai_client::network::ConnectionConfig;
///
/// let config = ConnectionConfig::new("xai-key")
///     .with_uri("ws://127.0.0.1:9000/v1/realtime")
///     .with_timeout(5000);
///
/// assert_eq!(config.timeout_ms, 5000);
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Realtime endpoint
    pub uri: String,

    /// Bearer token
    pub api_key: String,

    /// Connection timeout in milliseconds
    pub timeout_ms: u64,
}

impl ConnectionConfig {
    /// Create a configuration for the default endpoint
    pub fn new(api_key: impl Into<String>) -> Self {
        let defaults = VoiceConfig::default();
        Self {
            uri: defaults.uri,
            api_key: api_key.into(),
            timeout_ms: defaults.network_timeout_ms,
        }
    }

    /// Derive the connection settings from voice configuration
    pub fn from_voice_config(config: &VoiceConfig, api_key: impl Into<String>) -> Self {
        Self {
            uri: config.uri.clone(),
            api_key: api_key.into(),
            timeout_ms: config.network_timeout_ms,
        }
    }

    /// Set the endpoint
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }

    /// Set connection timeout in milliseconds
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// WebSocket connection to the realtime voice API
#[derive(Debug)]
pub struct VoiceConnection {
    /// WebSocket stream
    ws_stream: WsStream,
}

impl VoiceConnection {
    /// Connect to the realtime endpoint
    ///
    /// # Errors
    /// * `InvalidConfig` - empty API key or malformed URI
    /// * `Timeout` - handshake did not finish within `timeout_ms`
    /// * `AuthenticationFailed` - server answered 401
    /// * `ConnectionFailed` - any other handshake failure
    pub async fn connect(config: &ConnectionConfig) -> NetworkResult<Self> {
        if config.api_key.is_empty() {
            return Err(NetworkError::InvalidConfig("API key is empty".to_string()));
        }

        info!("Connecting to realtime endpoint {}", config.uri);

        let mut request = config
            .uri
            .as_str()
            .into_client_request()
            .map_err(|e| NetworkError::InvalidConfig(format!("Invalid URI: {}", e)))?;

        let auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|e| NetworkError::InvalidConfig(format!("Invalid API key: {}", e)))?;
        request.headers_mut().insert(AUTHORIZATION, auth);

        let timeout = tokio::time::Duration::from_millis(config.timeout_ms);

        let (ws_stream, response) = tokio::time::timeout(timeout, connect_async(request))
            .await
            .map_err(|_| NetworkError::Timeout(config.timeout_ms))?
            .map_err(|e| {
                if let tokio_tungstenite::tungstenite::Error::Http(resp) = &e {
                    if resp.status() == 401 {
                        return NetworkError::AuthenticationFailed;
                    }
                }
                NetworkError::ConnectionFailed(e.to_string())
            })?;

        info!("Connected (status: {})", response.status());
        debug!("Response headers: {:?}", response.headers());

        Ok(Self { ws_stream })
    }

    /// Split the connection into separate write and read halves
    pub fn split(self) -> (WsWriter, WsReader) {
        self.ws_stream.split()
    }
}

/// Serialize and send one client event
pub(crate) async fn send_event<S>(sink: &mut S, event: &ClientEvent) -> NetworkResult<()>
where
    S: Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let json = serde_json::to_string(event)?;
    debug!(event_type = event.event_type(), "Sending {} bytes", json.len());

    sink.send(Message::Text(json.into())).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_config_new() {
        let config = ConnectionConfig::new("key");

        assert_eq!(config.uri, "wss://api.x.ai/v1/realtime");
        assert_eq!(config.api_key, "key");
        assert_eq!(config.timeout_ms, 60_000);
    }

    #[test]
    fn test_connection_config_from_voice_config() {
        let voice = VoiceConfig {
            uri: "ws://localhost:1234/rt".to_string(),
            network_timeout_ms: 250,
            ..VoiceConfig::default()
        };
        let config = ConnectionConfig::from_voice_config(&voice, "k");

        assert_eq!(config.uri, "ws://localhost:1234/rt");
        assert_eq!(config.timeout_ms, 250);
    }

    #[tokio::test]
    async fn test_connect_rejects_empty_key() {
        let config = ConnectionConfig::new("");
        let result = VoiceConnection::connect(&config).await;

        assert!(matches!(result, Err(NetworkError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_uri() {
        let config = ConnectionConfig::new("key").with_uri("not a uri");
        let result = VoiceConnection::connect(&config).await;

        assert!(matches!(result, Err(NetworkError::InvalidConfig(_))));
    }
}
