//! Error types for the registry layer.

use crate::ConnectionId;

/// Errors that can occur during connection registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The connection was never registered (or already unregistered).
    #[error("connection {0} not registered")]
    NotRegistered(ConnectionId),

    /// The connection already has a room binding. Bindings are first-wins:
    /// a second `join` on the same connection is rejected.
    #[error("connection {0} is already bound to a room")]
    AlreadyBound(ConnectionId),
}
