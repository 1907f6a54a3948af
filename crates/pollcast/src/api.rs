//! Request/response surface over the room store.
//!
//! This is the contract an HTTP front end (or any embedder) programs
//! against: create a room, join it, end it, fetch its snapshot. The same
//! operations the WebSocket handler performs, minus the connection
//! binding.

use std::sync::Arc;

use pollcast_protocol::{RoomCode, RoomSnapshot};
use pollcast_room::RoomError;

use crate::server::ServerState;

/// Handle to a server's rooms. Cheap to clone.
#[derive(Clone)]
pub struct PollApi {
    state: Arc<ServerState>,
}

impl PollApi {
    pub(crate) fn new(state: Arc<ServerState>) -> Self {
        Self { state }
    }

    /// Creates a room and returns its join code.
    ///
    /// Fails with [`RoomError::InvalidInput`] if `admin_name` is empty.
    pub async fn create_room(
        &self,
        admin_name: &str,
    ) -> Result<RoomCode, RoomError> {
        self.state.rooms.lock().await.create(admin_name)
    }

    /// Adds a participant to a room.
    ///
    /// Fails with [`RoomError::NotFound`] for an unknown code,
    /// [`RoomError::DuplicateName`] if the name is taken by a live
    /// participant, and [`RoomError::InvalidInput`] for an empty name.
    pub async fn join_room(
        &self,
        code: &RoomCode,
        name: &str,
    ) -> Result<(), RoomError> {
        // Clone the handle out so the store lock isn't held across the
        // room round-trip.
        let room = self.state.rooms.lock().await.get(code)?;
        room.join(name).await
    }

    /// Ends a room: broadcasts `end`, cancels its countdown, releases
    /// all bound connections, and deletes it from the store.
    pub async fn end_room(&self, code: &RoomCode) -> Result<(), RoomError> {
        let deleted = self.state.rooms.lock().await.delete(code).await;
        if deleted {
            Ok(())
        } else {
            Err(RoomError::NotFound(code.clone()))
        }
    }

    /// Fetches the full state of a room.
    pub async fn room_snapshot(
        &self,
        code: &RoomCode,
    ) -> Result<RoomSnapshot, RoomError> {
        let room = self.state.rooms.lock().await.get(code)?;
        room.snapshot().await
    }
}
