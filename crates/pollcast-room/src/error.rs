//! Error types for the room layer.

use pollcast_protocol::RoomCode;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// The display name is already taken by a live participant of the
    /// room. Names free up again when their participant disconnects.
    #[error("name {name:?} is already taken in room {room}")]
    DuplicateName { name: String, room: RoomCode },

    /// A required field was missing or empty.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The room's command channel is closed — the actor is gone or
    /// shutting down.
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}
