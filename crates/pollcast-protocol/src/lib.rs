//! Wire protocol for Pollcast.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`ClientMessage`], [`ServerEvent`], [`RoomSnapshot`], etc.)
//!   — the JSON-framed message structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! The protocol layer sits between the transport (raw bytes) and the room
//! layer (poll state). It doesn't know about connections or rooms — it only
//! knows how to serialize and deserialize messages.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientMessage, QuestionPayload, QuestionSnapshot, RoomCode,
    RoomSnapshot, ServerEvent, StudentSnapshot,
};
