//! Per-connection handler: registration, message dispatch, teardown.
//!
//! Each accepted connection gets its own task running this handler. The
//! stream is split in two: a writer task drains the connection's bounded
//! event queue into the socket, while the read loop here decodes inbound
//! messages and dispatches them. The flow is:
//!
//!   1. Register with the connection registry (unbound).
//!   2. First `join` message binds the connection to a room (first-wins).
//!   3. Loop: decode client messages → route to the room actor.
//!   4. On close: unregister; a bound non-admin participant is removed
//!      from their room.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use pollcast_protocol::{
    ClientMessage, Codec, QuestionPayload, RoomCode, ServerEvent,
};
use pollcast_registry::{Binding, ConnectionId, EventSender, RegistryError};
use pollcast_room::RoomError;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::server::ServerState;
use crate::ws::WsStream;

/// Handles a single connection from accept to close.
///
/// Never returns an error: every failure path ends in teardown, and a bad
/// connection must not bubble anything fatal toward the accept loop.
pub(crate) async fn handle_connection(
    stream: WsStream,
    state: Arc<ServerState>,
) {
    let conn_id = ConnectionId::next();
    let (mut sink, mut source) = stream.split();

    let (event_tx, mut event_rx) =
        mpsc::channel::<ServerEvent>(state.outbound_queue);
    state.registry.register(conn_id, event_tx.clone());

    // Writer task: drains the event queue into the socket. Exits when the
    // queue closes (unregister drops the registry's sender, and the read
    // loop drops its clone) or when a send fails.
    let codec = state.codec;
    let writer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let bytes = match codec.encode(&event) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::error!(%conn_id, error = %e, "encode failed");
                    continue;
                }
            };
            if let Err(e) = sink.send(Message::Binary(bytes.into())).await
            {
                tracing::debug!(%conn_id, error = %e, "send failed");
                break;
            }
        }
        let _ = sink.close().await;
    });

    // Read loop.
    while let Some(msg) = source.next().await {
        let data = match msg {
            Ok(Message::Text(text)) => text.as_bytes().to_vec(),
            Ok(Message::Binary(data)) => data.to_vec(),
            Ok(Message::Close(_)) => break,
            // Ping/pong handled by tungstenite.
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        // A malformed message costs only itself; the connection stays up.
        let client_msg: ClientMessage = match state.codec.decode(&data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(
                    %conn_id,
                    error = %e,
                    "ignoring malformed message"
                );
                continue;
            }
        };

        dispatch(conn_id, client_msg, &state, &event_tx).await;
    }

    // Teardown: the registry entry goes first so broadcasts stop, then
    // the room learns about departed participants.
    if let Some(binding) = state.registry.unregister(conn_id) {
        if !binding.is_admin {
            let room = state.rooms.lock().await.get(&binding.room_code);
            if let Ok(room) = room {
                let _ = room.disconnect(&binding.user).await;
            }
        }
    }

    drop(event_tx);
    let _ = writer.await;
    tracing::debug!(%conn_id, "connection closed");
}

/// Routes one decoded client message.
async fn dispatch(
    conn_id: ConnectionId,
    msg: ClientMessage,
    state: &Arc<ServerState>,
    events: &EventSender,
) {
    match msg {
        ClientMessage::Join {
            room_code,
            user,
            is_admin,
        } => {
            if let Err(e) = handle_join(
                conn_id, &room_code, &user, is_admin, state, events,
            )
            .await
            {
                tracing::debug!(
                    %conn_id,
                    room = %room_code,
                    %user,
                    error = %e,
                    "join rejected"
                );
                send_error(events, &e).await;
            }
        }

        ClientMessage::Poll { room_code, question } => {
            if let Err(e) =
                handle_poll(&room_code, question, state).await
            {
                tracing::debug!(
                    %conn_id,
                    room = %room_code,
                    error = %e,
                    "poll rejected"
                );
                send_error(events, &e).await;
            }
        }

        ClientMessage::Answer {
            room_code,
            user,
            answer,
        } => {
            handle_answer(conn_id, &room_code, &user, answer, state)
                .await;
        }
    }
}

/// Binds the connection to a room, adding the participant first unless
/// it's the admin connection. Successful joiners are sent the current
/// room state directly, since the join broadcast predates their binding.
async fn handle_join(
    conn_id: ConnectionId,
    room_code: &RoomCode,
    user: &str,
    is_admin: bool,
    state: &Arc<ServerState>,
    events: &EventSender,
) -> Result<(), Rejection> {
    // Admin joins skip room membership, so the name check has to happen
    // here rather than in the room.
    if user.trim().is_empty() {
        return Err(Rejection::Room(RoomError::InvalidInput(
            "display name must not be empty".into(),
        )));
    }

    // First-wins: a connection joins at most one room, ever.
    if state.registry.binding(conn_id).is_some() {
        return Err(Rejection::Registry(
            RegistryError::AlreadyBound(conn_id),
        ));
    }

    let room = state
        .rooms
        .lock()
        .await
        .get(room_code)
        .map_err(Rejection::Room)?;

    // Membership before binding: if the name is taken, the connection
    // must not start receiving the room's events.
    if !is_admin {
        room.join(user).await.map_err(Rejection::Room)?;
    }

    state
        .registry
        .bind(
            conn_id,
            Binding {
                room_code: room_code.clone(),
                user: user.to_string(),
                is_admin,
            },
        )
        .map_err(Rejection::Registry)?;

    // Catch the joiner up: full snapshot, then the question in progress
    // if one is running (a mid-question joiner would otherwise see bare
    // `timer` ticks with no preceding `poll`).
    let snapshot = room.snapshot().await.map_err(Rejection::Room)?;
    let question = snapshot
        .current_question
        .and_then(|index| snapshot.questions.get(index).cloned());
    let _ = events
        .send(ServerEvent::Update { room: snapshot })
        .await;
    if question.is_some() {
        let _ = events.send(ServerEvent::Poll { question }).await;
    }
    Ok(())
}

async fn handle_poll(
    room_code: &RoomCode,
    question: QuestionPayload,
    state: &Arc<ServerState>,
) -> Result<(), Rejection> {
    let room = state
        .rooms
        .lock()
        .await
        .get(room_code)
        .map_err(Rejection::Room)?;
    room.push_question(question)
        .await
        .map(|_| ())
        .map_err(Rejection::Room)
}

/// Answers are fire-and-forget on the wire: failures (unknown room, no
/// active question) are logged, never surfaced to the sender.
async fn handle_answer(
    conn_id: ConnectionId,
    room_code: &RoomCode,
    user: &str,
    answer: Value,
    state: &Arc<ServerState>,
) {
    let room = state.rooms.lock().await.get(room_code);
    match room {
        Ok(room) => {
            let _ = room.submit_answer(user, answer).await;
        }
        Err(e) => {
            tracing::debug!(
                %conn_id,
                room = %room_code,
                error = %e,
                "answer for unknown room ignored"
            );
        }
    }
}

/// A rejected join or poll, for the `error` event back to the sender.
#[derive(Debug, thiserror::Error)]
enum Rejection {
    #[error(transparent)]
    Room(RoomError),
    #[error(transparent)]
    Registry(RegistryError),
}

/// Sends an `error` event to the offending connection only. Best-effort:
/// if its queue is gone or full we're tearing down anyway.
async fn send_error(events: &EventSender, rejection: &Rejection) {
    let _ = events
        .send(ServerEvent::Error {
            message: rejection.to_string(),
        })
        .await;
}
