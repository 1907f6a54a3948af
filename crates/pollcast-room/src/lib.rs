//! Room lifecycle management for Pollcast.
//!
//! Each room runs as an isolated Tokio task (actor model) owning its poll
//! state, participant list, and countdown. All mutations to a room —
//! joins, answers, disconnects, timer ticks — serialize through the
//! actor's command channel, so a tick can never race an answer.
//!
//! # Key types
//!
//! - [`RoomStore`] — creates/looks up/deletes rooms by code
//! - [`RoomHandle`] — send operations to a running room actor
//! - [`RoomPhase`] — the Idle ⇄ Active question state machine
//! - [`RoomError`] — what room operations can reject with

mod error;
mod model;
mod phase;
mod room;
mod store;

pub use error::RoomError;
pub use phase::RoomPhase;
pub use room::RoomHandle;
pub use store::RoomStore;
