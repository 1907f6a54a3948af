//! Unified error type for the Pollcast server.

use pollcast_protocol::ProtocolError;
use pollcast_registry::RegistryError;
use pollcast_room::RoomError;

use crate::ws::WsError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum PollcastError {
    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A connection-registry error (not registered, already bound).
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A room-level error (not found, duplicate name, invalid input).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A WebSocket transport error (bind, accept, send, receive).
    #[error(transparent)]
    Ws(#[from] WsError),
}
