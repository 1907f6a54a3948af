//! Core protocol types for Pollcast's wire format.
//!
//! Every message is a JSON object with a lowercase `type` tag and camelCase
//! fields, matching what the browser client sends and expects. Question
//! content is opaque to the server — only the `timer` field and the
//! `responses` map have meaning here; the rest of the payload (prompt text,
//! options, correct answer, whatever the caller wants) is carried through
//! untouched.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A room's short, human-typeable join code (e.g. `"ABC123"`).
///
/// Newtype over `String` so a room code can't be confused with a display
/// name in a function signature. `#[serde(transparent)]` keeps the wire
/// representation a plain JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Wraps a raw string as a room code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RoomCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Question payload
// ---------------------------------------------------------------------------

/// A question as pushed by the admin: a countdown duration plus an opaque
/// body.
///
/// `#[serde(flatten)]` folds the body's keys into the same JSON object as
/// `timer`, so `{"timer": 10, "text": "Q1", "options": ["a", "b"]}` parses
/// with `text`/`options` landing in `body` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionPayload {
    /// Countdown duration in seconds.
    pub timer: u32,

    /// Everything else in the question object. Opaque to the server.
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

/// A question as broadcast to the room: the payload plus the answers
/// collected so far, keyed by participant name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSnapshot {
    /// Countdown duration in seconds (as configured, not remaining).
    pub timer: u32,

    /// The opaque question body, carried through from the push.
    #[serde(flatten)]
    pub body: Map<String, Value>,

    /// Answers received while this question was active.
    #[serde(default)]
    pub responses: HashMap<String, Value>,
}

// ---------------------------------------------------------------------------
// Room snapshot
// ---------------------------------------------------------------------------

/// One participant's state inside a room snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StudentSnapshot {
    /// Answers keyed by question sequence index. A missing index means the
    /// participant did not answer that question.
    #[serde(default, deserialize_with = "deserialize_index_keyed_map")]
    pub answers: HashMap<usize, Value>,
}

/// Deserializes a map whose keys are question indices.
///
/// JSON object keys are always strings, and the internally tagged
/// [`ServerEvent`] enum buffers its content before dispatching, which loses
/// serde_json's native string-to-integer key conversion. Parsing the keys
/// explicitly keeps `{"0": ...}` round-tripping in both paths.
fn deserialize_index_keyed_map<'de, D>(
    deserializer: D,
) -> Result<HashMap<usize, Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = HashMap::<String, Value>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(key, value)| {
            key.parse::<usize>()
                .map(|index| (index, value))
                .map_err(serde::de::Error::custom)
        })
        .collect()
}

/// The full state of a room, as shipped in `update` events and snapshot
/// responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    /// The room's join code.
    pub code: RoomCode,

    /// Display name of the room's creator. Informational only.
    #[serde(rename = "adminName")]
    pub admin_name: String,

    /// Every question pushed so far, in push order.
    pub questions: Vec<QuestionSnapshot>,

    /// Participants currently in the room, keyed by display name.
    pub students: HashMap<String, StudentSnapshot>,

    /// Index into `questions` of the question currently accepting answers,
    /// or `None` while the room is idle.
    #[serde(rename = "currentQuestion")]
    pub current_question: Option<usize>,

    /// Seconds left on the countdown. Only meaningful while
    /// `current_question` is set.
    #[serde(rename = "timerSecondsRemaining")]
    pub timer_seconds_remaining: u32,
}

// ---------------------------------------------------------------------------
// Client → server messages
// ---------------------------------------------------------------------------

/// Messages a client sends to the server.
///
/// `#[serde(tag = "type", rename_all = "lowercase")]` produces internally
/// tagged JSON with lowercase tags: `{"type": "join", "roomCode": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Bind this connection to a room. Participants are added to the room's
    /// membership; admins (`isAdmin: true`) only attach for event delivery.
    Join {
        #[serde(rename = "roomCode")]
        room_code: RoomCode,
        user: String,
        #[serde(rename = "isAdmin", default)]
        is_admin: bool,
    },

    /// Admin pushes a new question, starting its countdown.
    Poll {
        #[serde(rename = "roomCode")]
        room_code: RoomCode,
        question: QuestionPayload,
    },

    /// Participant submits an answer to the active question. The answer is
    /// an opaque JSON value.
    Answer {
        #[serde(rename = "roomCode")]
        room_code: RoomCode,
        user: String,
        answer: Value,
    },
}

// ---------------------------------------------------------------------------
// Server → client events
// ---------------------------------------------------------------------------

/// Events the server pushes to connections in a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerEvent {
    /// A question started (`question` set) or closed (`question: null`).
    Poll { question: Option<QuestionSnapshot> },

    /// Seconds remaining on the active question, sent once per second.
    Timer { timer: u32 },

    /// Full room snapshot after a membership or answer change.
    Update { room: RoomSnapshot },

    /// The room was ended by its admin.
    End,

    /// The triggering message was rejected (unknown room, duplicate name,
    /// missing field). Sent only to the offending connection.
    Error { message: String },
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The wire format is fixed by the browser client. These tests pin the
    //! exact JSON shapes so a serde attribute change can't silently break
    //! the protocol.

    use super::*;
    use serde_json::json;

    // =====================================================================
    // RoomCode
    // =====================================================================

    #[test]
    fn test_room_code_serializes_as_plain_string() {
        let json = serde_json::to_string(&RoomCode::new("ABC123")).unwrap();
        assert_eq!(json, "\"ABC123\"");
    }

    #[test]
    fn test_room_code_deserializes_from_plain_string() {
        let code: RoomCode = serde_json::from_str("\"XY99ZZ\"").unwrap();
        assert_eq!(code, RoomCode::new("XY99ZZ"));
    }

    #[test]
    fn test_room_code_display() {
        assert_eq!(RoomCode::new("ABC123").to_string(), "ABC123");
    }

    // =====================================================================
    // ClientMessage
    // =====================================================================

    #[test]
    fn test_join_message_json_format() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "join",
            "roomCode": "ABC123",
            "user": "Bob",
            "isAdmin": false
        }))
        .unwrap();

        assert_eq!(
            msg,
            ClientMessage::Join {
                room_code: RoomCode::new("ABC123"),
                user: "Bob".into(),
                is_admin: false,
            }
        );
    }

    #[test]
    fn test_join_message_is_admin_defaults_to_false() {
        // Participant clients omit isAdmin entirely.
        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "join",
            "roomCode": "ABC123",
            "user": "Bob"
        }))
        .unwrap();

        assert!(matches!(
            msg,
            ClientMessage::Join { is_admin: false, .. }
        ));
    }

    #[test]
    fn test_poll_message_keeps_opaque_body() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "poll",
            "roomCode": "ABC123",
            "question": {
                "timer": 10,
                "text": "Capital of France?",
                "options": ["Paris", "Lyon"]
            }
        }))
        .unwrap();

        let ClientMessage::Poll { question, .. } = msg else {
            panic!("expected poll message");
        };
        assert_eq!(question.timer, 10);
        assert_eq!(question.body["text"], "Capital of France?");
        assert_eq!(question.body["options"], json!(["Paris", "Lyon"]));
    }

    #[test]
    fn test_answer_message_round_trip() {
        let msg = ClientMessage::Answer {
            room_code: RoomCode::new("ABC123"),
            user: "Bob".into(),
            answer: json!("yes"),
        };
        let bytes = serde_json::to_vec(&msg).unwrap();
        let decoded: ClientMessage = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn test_answer_message_json_tag_is_lowercase() {
        let msg = ClientMessage::Answer {
            room_code: RoomCode::new("ABC123"),
            user: "Bob".into(),
            answer: json!(2),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "answer");
        assert_eq!(value["roomCode"], "ABC123");
    }

    // =====================================================================
    // ServerEvent
    // =====================================================================

    #[test]
    fn test_poll_event_with_question() {
        let event = ServerEvent::Poll {
            question: Some(QuestionSnapshot {
                timer: 5,
                body: Map::new(),
                responses: HashMap::new(),
            }),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "poll");
        assert_eq!(value["question"]["timer"], 5);
    }

    #[test]
    fn test_poll_event_closure_is_null_question() {
        // Question closure is signalled as `poll {question: null}`.
        let event = ServerEvent::Poll { question: None };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "poll");
        assert!(value["question"].is_null());
    }

    #[test]
    fn test_timer_event_json_format() {
        let event = ServerEvent::Timer { timer: 4 };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "timer");
        assert_eq!(value["timer"], 4);
    }

    #[test]
    fn test_end_event_json_format() {
        let event = ServerEvent::End;
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value, json!({"type": "end"}));
    }

    #[test]
    fn test_error_event_round_trip() {
        let event = ServerEvent::Error {
            message: "room ZZZZZZ not found".into(),
        };
        let bytes = serde_json::to_vec(&event).unwrap();
        let decoded: ServerEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(event, decoded);
    }

    // =====================================================================
    // RoomSnapshot
    // =====================================================================

    #[test]
    fn test_room_snapshot_field_names_are_camel_case() {
        let snapshot = RoomSnapshot {
            code: RoomCode::new("ABC123"),
            admin_name: "Alice".into(),
            questions: vec![],
            students: HashMap::new(),
            current_question: None,
            timer_seconds_remaining: 0,
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["adminName"], "Alice");
        assert!(value["currentQuestion"].is_null());
        assert_eq!(value["timerSecondsRemaining"], 0);
    }

    #[test]
    fn test_room_snapshot_round_trip_with_answers() {
        let mut students = HashMap::new();
        students.insert(
            "Bob".to_string(),
            StudentSnapshot {
                answers: HashMap::from([(0, json!("yes"))]),
            },
        );
        let snapshot = RoomSnapshot {
            code: RoomCode::new("ABC123"),
            admin_name: "Alice".into(),
            questions: vec![QuestionSnapshot {
                timer: 5,
                body: Map::new(),
                responses: HashMap::from([("Bob".into(), json!("yes"))]),
            }],
            students,
            current_question: Some(0),
            timer_seconds_remaining: 3,
        };
        let bytes = serde_json::to_vec(&snapshot).unwrap();
        let decoded: RoomSnapshot = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(snapshot, decoded);
    }

    // =====================================================================
    // Malformed input
    // =====================================================================

    #[test]
    fn test_decode_garbage_returns_error() {
        let garbage = b"not json at all";
        let result: Result<ClientMessage, _> =
            serde_json::from_slice(garbage);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_unknown_type_tag_returns_error() {
        let unknown = r#"{"type": "teleport", "roomCode": "ABC123"}"#;
        let result: Result<ClientMessage, _> =
            serde_json::from_str(unknown);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_missing_required_field_returns_error() {
        // `user` is required on join.
        let missing = r#"{"type": "join", "roomCode": "ABC123"}"#;
        let result: Result<ClientMessage, _> =
            serde_json::from_str(missing);
        assert!(result.is_err());
    }
}
