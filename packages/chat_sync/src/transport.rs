//! Channel transport
//!
//! The real WebSocket connector plus the [`Connector`] seam the client is
//! generic over, so tests can drive the channel deterministically without a
//! socket. No reconnect policy lives here: a closed transport delivers one
//! terminal [`ChannelEvent::Closed`] and the embedder decides when to try
//! again.

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tracing::{debug, warn};

use crate::protocol::{ClientEvent, ServerEvent};

/// What the transport delivers to the owning loop.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Event(ServerEvent),
    /// The transport ended, deliberately or not. Terminal for this
    /// connection.
    Closed,
}

/// Transport-level connect failure.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("push channel is unavailable")]
    Unavailable,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ChannelError {
    pub fn from_tungstenite(err: tungstenite::Error) -> Self {
        let is_connect = match &err {
            tungstenite::Error::Io(io_err) => matches!(
                io_err.kind(),
                std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
            ),
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => true,
            _ => false,
        };
        if is_connect {
            Self::Unavailable
        } else {
            Self::Other(err.into())
        }
    }
}

/// Live transport handles returned by a successful connect.
pub struct ChannelHandle {
    pub outbound: mpsc::UnboundedSender<ClientEvent>,
    pub inbound: mpsc::UnboundedReceiver<ChannelEvent>,
}

/// Seam between the client and the wire.
#[allow(async_fn_in_trait)]
pub trait Connector {
    async fn connect(&self) -> Result<ChannelHandle, ChannelError>;
}

/// tokio-tungstenite connector against the storefront push endpoint.
///
/// The operator token rides as a query parameter; identification itself is
/// the `identify-as-operator` event sent by the connection manager once the
/// transport is up.
pub struct WsConnector {
    url: String,
    token: Option<String>,
}

impl WsConnector {
    pub fn new(url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            url: url.into(),
            token,
        }
    }

    fn connect_url(&self) -> String {
        match &self.token {
            Some(token) => format!("{}?token={}", self.url, token),
            None => self.url.clone(),
        }
    }
}

impl Connector for WsConnector {
    async fn connect(&self) -> Result<ChannelHandle, ChannelError> {
        let (ws_stream, _) = tokio_tungstenite::connect_async(self.connect_url())
            .await
            .map_err(ChannelError::from_tungstenite)?;
        debug!(url = %self.url, "push channel transport connected");
        let (mut ws_write, mut ws_read) = ws_stream.split();

        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<ClientEvent>();
        let (inbound_tx, inbound) = mpsc::unbounded_channel::<ChannelEvent>();

        // Writer: serialize client events until the outbound handle drops,
        // then close the socket.
        tokio::spawn(async move {
            while let Some(event) = outbound_rx.recv().await {
                let json = match serde_json::to_string(&event) {
                    Ok(json) => json,
                    Err(err) => {
                        warn!(error = %err, "failed to encode client event");
                        continue;
                    }
                };
                if ws_write
                    .send(tungstenite::Message::Text(json.into()))
                    .await
                    .is_err()
                {
                    break;
                }
            }
            let _ = ws_write.close().await;
        });

        // Reader: parse-or-drop inbound frames, then report Closed exactly
        // once.
        tokio::spawn(async move {
            while let Some(frame) = ws_read.next().await {
                match frame {
                    Ok(tungstenite::Message::Text(text)) => {
                        match serde_json::from_str::<ServerEvent>(&text) {
                            Ok(event) => {
                                if inbound_tx.send(ChannelEvent::Event(event)).is_err() {
                                    return;
                                }
                            }
                            Err(err) => {
                                warn!(error = %err, "malformed channel event dropped");
                            }
                        }
                    }
                    Ok(tungstenite::Message::Close(_)) | Err(_) => break,
                    Ok(_) => {} // ping/pong/binary are not part of the contract
                }
            }
            let _ = inbound_tx.send(ChannelEvent::Closed);
        });

        Ok(ChannelHandle { outbound, inbound })
    }
}
