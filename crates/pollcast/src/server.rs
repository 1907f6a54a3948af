//! Server builder and accept loop.
//!
//! Ties the layers together: WebSocket listener → protocol codec →
//! connection registry → room store. One handler task per connection;
//! one actor task per room.

use std::sync::Arc;

use pollcast_protocol::JsonCodec;
use pollcast_registry::ConnectionRegistry;
use pollcast_room::RoomStore;
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::ws::WsListener;
use crate::{PollApi, PollcastError};

/// Default bound on each connection's outbound event queue. A client that
/// falls this many events behind starts losing events instead of stalling
/// broadcasts.
const DEFAULT_OUTBOUND_QUEUE: usize = 64;

/// Shared server state, one per process. Cheaply cloned across handler
/// tasks via `Arc`.
pub(crate) struct ServerState {
    /// All live rooms. The mutex guards only the code → handle map;
    /// per-room state is serialized by each room's actor.
    pub(crate) rooms: Mutex<RoomStore>,
    pub(crate) registry: Arc<ConnectionRegistry>,
    pub(crate) codec: JsonCodec,
    pub(crate) outbound_queue: usize,
}

/// Builder for configuring and starting a Pollcast server.
pub struct ServerBuilder {
    bind_addr: String,
    outbound_queue: usize,
}

impl ServerBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            outbound_queue: DEFAULT_OUTBOUND_QUEUE,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the per-connection outbound queue bound.
    pub fn outbound_queue(mut self, size: usize) -> Self {
        self.outbound_queue = size.max(1);
        self
    }

    /// Binds the listener and builds the server.
    pub async fn build(self) -> Result<PollServer, PollcastError> {
        let listener = WsListener::bind(&self.bind_addr).await?;
        let registry = Arc::new(ConnectionRegistry::new());

        let state = Arc::new(ServerState {
            rooms: Mutex::new(RoomStore::new(Arc::clone(&registry))),
            registry,
            codec: JsonCodec,
            outbound_queue: self.outbound_queue,
        });

        Ok(PollServer { listener, state })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Pollcast server. Call [`run`](Self::run) to start accepting
/// connections.
pub struct PollServer {
    listener: WsListener,
    state: Arc<ServerState>,
}

impl PollServer {
    /// Creates a new builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Returns the request/response API surface for this server's rooms.
    ///
    /// Useful for embedding: an HTTP front end (or a test) can create,
    /// join, end, and snapshot rooms without going through a socket.
    pub fn api(&self) -> PollApi {
        PollApi::new(Arc::clone(&self.state))
    }

    /// Runs the accept loop until the process exits.
    ///
    /// Each connection gets its own handler task, so a panicking or
    /// misbehaving connection never takes the server down. Accept
    /// failures are logged and the loop keeps serving.
    pub async fn run(self) -> Result<(), PollcastError> {
        tracing::info!("pollcast server running");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        handle_connection(stream, state).await;
                        tracing::debug!(%addr, "connection handler finished");
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
