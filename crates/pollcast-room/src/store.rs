//! Room store: creates, looks up, and deletes rooms by join code.

use std::collections::HashMap;
use std::sync::Arc;

use pollcast_protocol::RoomCode;
use pollcast_registry::ConnectionRegistry;
use rand::Rng;

use crate::room::spawn_room;
use crate::{RoomError, RoomHandle};

/// Command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Characters used in generated room codes. Uppercase letters and digits,
/// minus the lookalikes (O/0, I/1/L) — codes get read aloud and typed.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Length of a generated room code.
const CODE_LEN: usize = 6;

/// Owns the mapping from room code to running room actor.
///
/// No concurrency control of its own — the server wraps the store in a
/// mutex, and everything inside a room serializes through that room's
/// actor.
pub struct RoomStore {
    rooms: HashMap<RoomCode, RoomHandle>,
    registry: Arc<ConnectionRegistry>,
}

impl RoomStore {
    /// Creates an empty store. Room actors broadcast through `registry`.
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            rooms: HashMap::new(),
            registry,
        }
    }

    /// Creates a new room and returns its code.
    ///
    /// Codes are short, so collisions are a real possibility at scale:
    /// generation loops until the code is unique among live rooms rather
    /// than trusting randomness alone.
    pub fn create(
        &mut self,
        admin_name: &str,
    ) -> Result<RoomCode, RoomError> {
        if admin_name.trim().is_empty() {
            return Err(RoomError::InvalidInput(
                "admin name must not be empty".into(),
            ));
        }

        let code = loop {
            let candidate = generate_code();
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
        };

        let handle = spawn_room(
            code.clone(),
            admin_name.to_string(),
            Arc::clone(&self.registry),
            DEFAULT_CHANNEL_SIZE,
        );
        self.rooms.insert(code.clone(), handle);
        tracing::info!(room = %code, admin = %admin_name, "room created");
        Ok(code)
    }

    /// Looks up a room, returning a cloned handle to its actor.
    pub fn get(&self, code: &RoomCode) -> Result<RoomHandle, RoomError> {
        self.rooms
            .get(code)
            .cloned()
            .ok_or_else(|| RoomError::NotFound(code.clone()))
    }

    /// Ends and removes a room. Idempotent: returns `false` (and does
    /// nothing) if the code is unknown.
    pub async fn delete(&mut self, code: &RoomCode) -> bool {
        let Some(handle) = self.rooms.remove(code) else {
            return false;
        };
        // Actor may already be gone if it stopped on its own; either way
        // the room is no longer reachable.
        let _ = handle.end().await;
        tracing::info!(room = %code, "room deleted");
        true
    }

    /// Number of live rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether no rooms are live.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Lists the codes of all live rooms.
    pub fn codes(&self) -> Vec<RoomCode> {
        self.rooms.keys().cloned().collect()
    }
}

/// Generates a random candidate room code. Uniqueness is the caller's job.
fn generate_code() -> RoomCode {
    let mut rng = rand::rng();
    let code: String = (0..CODE_LEN)
        .map(|_| {
            let index = rng.random_range(0..CODE_ALPHABET.len());
            CODE_ALPHABET[index] as char
        })
        .collect();
    RoomCode::new(code)
}
