//! Live connection tracking and broadcast fan-out for Pollcast.
//!
//! The registry knows about every connected client: its outbound event
//! queue and, once the client has sent a `join`, which room it belongs to
//! and under what name. Room actors use it to fan events out to everyone
//! in their room.
//!
//! # Key types
//!
//! - [`ConnectionRegistry`] — register/bind/unregister, broadcast
//! - [`ConnectionId`] — opaque per-connection identifier
//! - [`Binding`] — a connection's room association, set once per connection
//!
//! # Delivery model
//!
//! Fan-out is best-effort and non-blocking. Each connection has a bounded
//! event queue; a full or closed queue costs that connection the event,
//! never the sender. Broadcasts snapshot the member list first, so
//! concurrent registration and unregistration can't disturb an iteration.

mod error;
mod registry;

pub use error::RegistryError;
pub use registry::{
    Binding, ConnectionId, ConnectionRegistry, EventSender,
};
