//! Coinbase source implementation

use crate::config::{CoinbaseSourceConfig, CONFIG_SCHEMA};
use crate::SOURCE_TYPE;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use relay_connect_core::{Configurable, ConnectorError, ConnectorResult, Event, Source};
use serde_json::Value;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

type FeedStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Failures of the feed transport, before they are tagged with the endpoint
#[derive(Debug, Error)]
enum FeedError {
    #[error("WebSocket error: {0}")]
    Transport(#[from] tungstenite::Error),

    #[error("Malformed feed message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Feed closed: {0}")]
    Closed(String),
}

/// Source streaming messages from the Coinbase Exchange WebSocket feed
pub struct CoinbaseSource {
    config: CoinbaseSourceConfig,
    websocket: Option<FeedStream>,
}

impl CoinbaseSource {
    /// Create a Coinbase source with configuration
    pub fn with_config(config: CoinbaseSourceConfig) -> Self {
        Self {
            config,
            websocket: None,
        }
    }

    pub fn config(&self) -> &CoinbaseSourceConfig {
        &self.config
    }
}

impl Configurable for CoinbaseSource {
    fn config_schema() -> &'static Value {
        &CONFIG_SCHEMA
    }

    fn from_config(config: Value) -> ConnectorResult<Self> {
        Ok(Self::with_config(CoinbaseSourceConfig::from_value(config)?))
    }
}

#[async_trait]
impl Source for CoinbaseSource {
    fn name(&self) -> &str {
        self.config.name.as_deref().unwrap_or(SOURCE_TYPE)
    }

    async fn connect(&mut self) -> ConnectorResult<Value> {
        if self.websocket.is_some() {
            debug!("Already connected, dropping the previous feed connection");
            self.disconnect().await;
        }

        info!("Connecting to Coinbase WebSocket feed");
        let timeout = self.config.handshake_timeout();
        let (mut ws, confirmation) =
            match tokio::time::timeout(timeout, open_and_subscribe(&self.config)).await {
                Ok(Ok(handshake)) => handshake,
                Ok(Err(e)) => {
                    error!("Lost connection to Coinbase WebSocket feed: {}", e);
                    return Err(ConnectorError::connection_with_source(
                        SOURCE_TYPE,
                        format!("Lost connection to Coinbase WebSocket feed: {}", e),
                        e,
                    ));
                }
                Err(_) => {
                    error!("Coinbase handshake did not complete within {:?}", timeout);
                    return Err(ConnectorError::connection(
                        SOURCE_TYPE,
                        format!("Handshake timed out after {:?}", timeout),
                    ));
                }
            };

        if confirmation.get("type").and_then(Value::as_str) != Some("subscriptions") {
            error!(
                "Failed to subscribe to the Coinbase WebSocket feed: {}",
                confirmation
            );
            if let Err(e) = ws.close(None).await {
                debug!("Error closing rejected feed connection: {}", e);
            }
            return Err(ConnectorError::connection(
                SOURCE_TYPE,
                format!(
                    "Failed to subscribe to the Coinbase WebSocket feed: {}",
                    confirmation
                ),
            ));
        }

        self.websocket = Some(ws);
        Ok(confirmation)
    }

    async fn receive(&mut self) -> ConnectorResult<Event> {
        let ws = self.websocket.as_mut().ok_or_else(|| {
            ConnectorError::not_connected(SOURCE_TYPE, "Must connect before receiving")
        })?;

        match next_message(ws).await {
            Ok(payload) => Ok(Event::new(payload)),
            Err(e) => {
                error!("Error receiving message: {}", e);
                self.disconnect().await;
                Err(ConnectorError::receive_with_source(
                    SOURCE_TYPE,
                    e.to_string(),
                    e,
                ))
            }
        }
    }

    async fn disconnect(&mut self) {
        let Some(mut ws) = self.websocket.take() else {
            return;
        };

        info!("Disconnecting from Coinbase WebSocket feed");
        match ws.close(None).await {
            Ok(()) => info!("Disconnected from Coinbase WebSocket feed"),
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                debug!("Coinbase WebSocket feed was already closed");
            }
            Err(e) => warn!("Error during disconnect: {}", e),
        }
    }

    fn is_connected(&self) -> bool {
        self.websocket.is_some()
    }
}

async fn open_and_subscribe(
    config: &CoinbaseSourceConfig,
) -> Result<(FeedStream, Value), FeedError> {
    let (mut ws, _response) = connect_async(config.wss_url.as_str()).await?;
    info!("Connected to Coinbase WebSocket feed at {}", config.wss_url);

    let subscribe = config.subscribe_message();
    info!("Sending subscription message: {}", subscribe);
    ws.send(Message::Text(subscribe.to_string().into())).await?;

    let confirmation = next_message(&mut ws).await?;
    info!("Subscription confirmation received: {}", confirmation);
    Ok((ws, confirmation))
}

/// Read frames until one carries a JSON document, answering pings on the way
async fn next_message(ws: &mut FeedStream) -> Result<Value, FeedError> {
    loop {
        let frame = ws
            .next()
            .await
            .ok_or_else(|| FeedError::Closed("stream ended".to_string()))??;

        match frame {
            Message::Text(text) => return Ok(serde_json::from_str(text.as_str())?),
            Message::Binary(data) => return Ok(serde_json::from_slice(&data)?),
            Message::Ping(data) => ws.send(Message::Pong(data)).await?,
            Message::Pong(_) | Message::Frame(_) => {}
            Message::Close(frame) => {
                let reason = frame
                    .map(|f| format!("{} {}", f.code, f.reason))
                    .unwrap_or_else(|| "no close frame".to_string());
                return Err(FeedError::Closed(reason));
            }
        }
    }
}
