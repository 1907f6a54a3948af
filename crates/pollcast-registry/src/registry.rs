//! The connection registry: every live connection, and who it claims to be.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use pollcast_protocol::{RoomCode, ServerEvent};
use tokio::sync::mpsc;

use crate::RegistryError;

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for a live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocates the next process-unique connection ID.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Channel sender for delivering events to one connection's writer task.
///
/// Bounded: a slow client's queue fills up and further events to it are
/// dropped rather than blocking the broadcaster.
pub type EventSender = mpsc::Sender<ServerEvent>;

/// A connection's room association. Set exactly once, on the first `join`
/// message, and immutable for the rest of the connection's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// The room this connection belongs to.
    pub room_code: RoomCode,
    /// The display name the connection joined under.
    pub user: String,
    /// Whether this is the room's admin connection. Admin connections are
    /// not room members — their disconnect never touches membership.
    pub is_admin: bool,
}

struct Entry {
    sender: EventSender,
    binding: Option<Binding>,
}

/// Tracks every live connection and fans events out per room.
///
/// Interior mutability with a plain `std::sync::Mutex`: every critical
/// section is a map lookup or a snapshot copy, never I/O or an `.await`,
/// so the lock is safe to take from async contexts. Room actors and
/// connection handlers share one registry behind an `Arc`.
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<ConnectionId, Entry>>,
}

impl ConnectionRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
        }
    }

    /// Locks the connection map. Poisoning is ignored: every critical
    /// section is a plain map mutation, so the data can't be left in a
    /// half-updated state, and a panicked handler task must not take the
    /// registry down with it.
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ConnectionId, Entry>> {
        self.connections
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Adds a connection with no room association yet.
    pub fn register(&self, id: ConnectionId, sender: EventSender) {
        let mut connections = self.lock();
        connections.insert(
            id,
            Entry {
                sender,
                binding: None,
            },
        );
        tracing::debug!(%id, total = connections.len(), "connection registered");
    }

    /// Associates a connection with a room. First-wins: a connection that
    /// is already bound keeps its original binding and the call fails.
    pub fn bind(
        &self,
        id: ConnectionId,
        binding: Binding,
    ) -> Result<(), RegistryError> {
        let mut connections = self.lock();
        let entry = connections
            .get_mut(&id)
            .ok_or(RegistryError::NotRegistered(id))?;
        if entry.binding.is_some() {
            return Err(RegistryError::AlreadyBound(id));
        }
        tracing::debug!(
            %id,
            room = %binding.room_code,
            user = %binding.user,
            is_admin = binding.is_admin,
            "connection bound"
        );
        entry.binding = Some(binding);
        Ok(())
    }

    /// Removes a connection, returning its binding (if it had one) so the
    /// caller can run the disconnect side-effect for non-admin members.
    pub fn unregister(&self, id: ConnectionId) -> Option<Binding> {
        let mut connections = self.lock();
        let entry = connections.remove(&id)?;
        tracing::debug!(%id, total = connections.len(), "connection unregistered");
        entry.binding
    }

    /// Returns a copy of a connection's binding, if any.
    pub fn binding(&self, id: ConnectionId) -> Option<Binding> {
        let connections = self.lock();
        connections.get(&id).and_then(|e| e.binding.clone())
    }

    /// Delivers an event to every connection bound to `room_code`.
    ///
    /// Snapshot-then-iterate: the member list is copied under the lock,
    /// then each delivery happens lock-free with `try_send`. A full or
    /// closed queue is logged and costs only that connection the event.
    pub fn broadcast(&self, room_code: &RoomCode, event: &ServerEvent) {
        let targets: Vec<(ConnectionId, EventSender)> = {
            let connections = self.lock();
            connections
                .iter()
                .filter(|(_, entry)| {
                    entry
                        .binding
                        .as_ref()
                        .is_some_and(|b| &b.room_code == room_code)
                })
                .map(|(id, entry)| (*id, entry.sender.clone()))
                .collect()
        };

        for (id, sender) in targets {
            match sender.try_send(event.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(
                        %id,
                        room = %room_code,
                        "outbound queue full, dropping event"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    // Writer task already gone; unregister will clean up.
                    tracing::debug!(
                        %id,
                        room = %room_code,
                        "outbound queue closed, dropping event"
                    );
                }
            }
        }
    }

    /// Clears the room association of every connection bound to
    /// `room_code`. Used when a room ends: the connections stay open but
    /// no longer belong to any room.
    pub fn release_room(&self, room_code: &RoomCode) {
        let mut connections = self.lock();
        let mut released = 0usize;
        for entry in connections.values_mut() {
            if entry
                .binding
                .as_ref()
                .is_some_and(|b| &b.room_code == room_code)
            {
                entry.binding = None;
                released += 1;
            }
        }
        if released > 0 {
            tracing::debug!(
                room = %room_code,
                released,
                "room bindings released"
            );
        }
    }

    /// Number of connections currently bound to a room.
    pub fn connections_in(&self, room_code: &RoomCode) -> usize {
        let connections = self.lock();
        connections
            .values()
            .filter(|entry| {
                entry
                    .binding
                    .as_ref()
                    .is_some_and(|b| &b.room_code == room_code)
            })
            .count()
    }

    /// Total number of registered connections.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no connections are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
