//! WebSocket connection
//!
//! Thin wrapper over tokio-tungstenite with connect timeout, TCP_NODELAY on
//! plain sockets and close tracking. No logging in send/recv.

use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};

/// WebSocket connection
pub struct WebSocketConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    state: ConnectionState,
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

/// Errors that can occur with WebSocket connections
#[derive(Debug, thiserror::Error)]
pub enum WebSocketError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Send failed: {0}")]
    SendFailed(String),
    #[error("Receive failed: {0}")]
    ReceiveFailed(String),
    #[error("Timeout")]
    Timeout,
    #[error("Not connected")]
    NotConnected,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, WebSocketError>;

impl WebSocketConnection {
    /// Connect to WebSocket endpoint
    pub async fn connect(url: &str, connect_timeout: Duration) -> Result<Self> {
        let (ws_stream, _) = timeout(connect_timeout, connect_async(url))
            .await
            .map_err(|_| WebSocketError::Timeout)?
            .map_err(|e| WebSocketError::ConnectionFailed(e.to_string()))?;

        if let MaybeTlsStream::Plain(tcp) = ws_stream.get_ref() {
            tcp.set_nodelay(true)
                .map_err(|e| WebSocketError::ConnectionFailed(e.to_string()))?;
        }

        Ok(Self {
            stream: ws_stream,
            state: ConnectionState::Connected,
        })
    }

    /// Send a message
    pub async fn send(&mut self, msg: Message) -> Result<()> {
        if self.state != ConnectionState::Connected {
            return Err(WebSocketError::NotConnected);
        }

        self.stream
            .send(msg)
            .await
            .map_err(|e| WebSocketError::SendFailed(e.to_string()))?;
        Ok(())
    }

    /// Send text message
    #[inline]
    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        self.send(Message::text(text)).await
    }

    /// Receive a message. Returns `None` on graceful close.
    pub async fn recv(&mut self) -> Result<Option<Message>> {
        if self.state != ConnectionState::Connected {
            return Err(WebSocketError::NotConnected);
        }

        match self.stream.next().await {
            Some(Ok(msg)) => {
                match &msg {
                    // Binance drops connections that miss pongs
                    Message::Ping(payload) => {
                        self.send(Message::Pong(payload.clone())).await?;
                    }
                    Message::Close(_) => {
                        self.state = ConnectionState::Disconnected;
                    }
                    _ => {}
                }
                Ok(Some(msg))
            }
            Some(Err(e)) => {
                self.state = ConnectionState::Disconnected;
                Err(WebSocketError::ReceiveFailed(e.to_string()))
            }
            None => {
                self.state = ConnectionState::Disconnected;
                Ok(None)
            }
        }
    }

    #[inline(always)]
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Close the connection gracefully
    pub async fn close(&mut self) -> Result<()> {
        if self.state == ConnectionState::Connected {
            let _ = self.stream.close(None).await;
            self.state = ConnectionState::Disconnected;
        }
        Ok(())
    }
}
