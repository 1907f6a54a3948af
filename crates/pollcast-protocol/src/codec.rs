//! Codec trait and implementations for serializing/deserializing messages.
//!
//! The protocol layer doesn't care HOW messages become bytes — it just
//! needs something that implements [`Codec`]. [`JsonCodec`] is the default
//! (the browser client speaks JSON); a binary codec could be added behind
//! another feature flag without touching other code.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because a codec lives inside long-running
/// connection-handler tasks that Tokio may schedule on any thread.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON via `serde_json`.
///
/// Human-readable, inspectable in browser DevTools, and the format the
/// wire protocol is specified in. Behind the default `json` feature.
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{RoomCode, ServerEvent};

    #[test]
    fn test_json_codec_round_trip() {
        let codec = JsonCodec;
        let event = ServerEvent::Timer { timer: 3 };
        let bytes = codec.encode(&event).unwrap();
        let decoded: ServerEvent = codec.decode(&bytes).unwrap();
        assert_eq!(event, decoded);
    }

    #[test]
    fn test_json_codec_decode_error_is_decode_variant() {
        let codec = JsonCodec;
        let result: Result<RoomCode, _> = codec.decode(b"{broken");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
