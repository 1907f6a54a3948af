//! WebSocket listener built on `tokio-tungstenite`.
//!
//! Thin plumbing: accept TCP connections, run the WebSocket handshake,
//! and hand the stream to the connection handler. The handler splits the
//! stream so the writer task can push broadcasts while the read loop is
//! parked on the next inbound frame.

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::WebSocketStream;

/// An accepted server-side WebSocket stream.
pub(crate) type WsStream = WebSocketStream<TcpStream>;

/// Errors from the WebSocket layer.
#[derive(Debug, thiserror::Error)]
pub enum WsError {
    /// Binding the listen address failed.
    #[error("bind failed: {0}")]
    Bind(#[source] std::io::Error),

    /// Accepting a TCP connection failed.
    #[error("accept failed: {0}")]
    Accept(#[source] std::io::Error),

    /// The WebSocket handshake failed on an accepted connection.
    #[error("websocket handshake failed: {0}")]
    Handshake(#[source] tokio_tungstenite::tungstenite::Error),
}

/// Listens for incoming WebSocket connections.
pub struct WsListener {
    listener: TcpListener,
}

impl WsListener {
    /// Binds a listener to the given address.
    pub async fn bind(addr: &str) -> Result<Self, WsError> {
        let listener =
            TcpListener::bind(addr).await.map_err(WsError::Bind)?;
        tracing::info!(addr, "websocket listener bound");
        Ok(Self { listener })
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Waits for the next connection and completes its handshake.
    pub(crate) async fn accept(
        &self,
    ) -> Result<(WsStream, SocketAddr), WsError> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(WsError::Accept)?;

        let ws = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(WsError::Handshake)?;

        tracing::debug!(%addr, "accepted websocket connection");
        Ok((ws, addr))
    }
}
