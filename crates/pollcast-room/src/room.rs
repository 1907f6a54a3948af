//! Room actor: an isolated Tokio task that owns one poll session.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. The actor is the room's single serialization
//! point: joins, answers, disconnects, and countdown ticks all pass
//! through the same loop, so none of them can race another. Broadcasts
//! are issued from inside the loop, which is what makes each room's event
//! stream totally ordered.

use std::sync::Arc;

use pollcast_protocol::{QuestionPayload, RoomCode, RoomSnapshot, ServerEvent};
use pollcast_registry::ConnectionRegistry;
use pollcast_timer::Countdown;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::RoomError;
use crate::model::Room;

/// Operations the outside world can request from a room actor.
///
/// Fallible operations carry a `oneshot::Sender` reply channel; answer
/// submission and disconnects are fire-and-forget.
pub(crate) enum RoomCommand {
    /// Add a participant to the room.
    Join {
        name: String,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Push a new question and start its countdown.
    PushQuestion {
        question: QuestionPayload,
        reply: oneshot::Sender<Result<usize, RoomError>>,
    },

    /// Record a participant's answer to the active question.
    SubmitAnswer { name: String, answer: Value },

    /// A participant's connection closed.
    Disconnect { name: String },

    /// Request the current room snapshot.
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },

    /// End the room: broadcast `end`, release bindings, stop the actor.
    End { reply: oneshot::Sender<()> },
}

/// Handle to a running room actor. Cheap to clone — just an `mpsc::Sender`
/// wrapper. The `RoomStore` holds one per live room.
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// The room's join code.
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Adds a participant with the given display name.
    pub async fn join(&self, name: &str) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                name: name.to_string(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?
    }

    /// Pushes a question, returning its sequence index.
    pub async fn push_question(
        &self,
        question: QuestionPayload,
    ) -> Result<usize, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::PushQuestion {
                question,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?
    }

    /// Submits an answer (fire-and-forget). Answers outside an active
    /// question are silently ignored by the actor.
    pub async fn submit_answer(
        &self,
        name: &str,
        answer: Value,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::SubmitAnswer {
                name: name.to_string(),
                answer,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Reports that a participant's connection closed.
    pub async fn disconnect(&self, name: &str) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Disconnect {
                name: name.to_string(),
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Requests the current room snapshot.
    pub async fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Ends the room and waits for the actor to finish its teardown
    /// (final `end` broadcast and binding release).
    pub async fn end(&self) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::End { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room: Room,
    countdown: Countdown,
    registry: Arc<ConnectionRegistry>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop until the room ends or every handle is dropped.
    async fn run(mut self) {
        tracing::info!(room = %self.room.code(), "room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    match cmd {
                        Some(RoomCommand::Join { name, reply }) => {
                            let _ = reply.send(self.handle_join(&name));
                        }
                        Some(RoomCommand::PushQuestion { question, reply }) => {
                            let _ = reply.send(Ok(self.handle_push(question)));
                        }
                        Some(RoomCommand::SubmitAnswer { name, answer }) => {
                            self.handle_answer(&name, answer);
                        }
                        Some(RoomCommand::Disconnect { name }) => {
                            self.handle_disconnect(&name);
                        }
                        Some(RoomCommand::Snapshot { reply }) => {
                            let _ = reply.send(self.room.snapshot());
                        }
                        Some(RoomCommand::End { reply }) => {
                            self.handle_end();
                            let _ = reply.send(());
                            break;
                        }
                        // All handles dropped — the store removed us.
                        None => break,
                    }
                }
                remaining = self.countdown.tick() => {
                    self.handle_tick(remaining);
                }
            }
        }

        tracing::info!(room = %self.room.code(), "room actor stopped");
    }

    fn handle_join(&mut self, name: &str) -> Result<(), RoomError> {
        self.room.join(name)?;
        tracing::info!(
            room = %self.room.code(),
            %name,
            "participant joined"
        );
        self.broadcast_update();
        Ok(())
    }

    fn handle_push(&mut self, question: QuestionPayload) -> usize {
        let timer = question.timer;
        let index = self.room.push_question(question);
        // Always restarts the countdown — a still-running question is
        // preempted rather than leaving two tick streams interleaved.
        self.countdown.start(timer);
        tracing::info!(
            room = %self.room.code(),
            index,
            timer,
            "question started"
        );
        self.broadcast(ServerEvent::Poll {
            question: self.room.current_question_snapshot(),
        });
        index
    }

    fn handle_answer(&mut self, name: &str, answer: Value) {
        if self.room.record_answer(name, answer) {
            self.broadcast_update();
        } else {
            // No active question, or not a member. Ignored by design.
            tracing::debug!(
                room = %self.room.code(),
                %name,
                phase = %self.room.phase(),
                "answer ignored"
            );
        }
    }

    fn handle_disconnect(&mut self, name: &str) {
        if self.room.remove_student(name) {
            tracing::info!(
                room = %self.room.code(),
                %name,
                "participant left"
            );
            self.broadcast_update();
        }
    }

    fn handle_tick(&mut self, remaining: u32) {
        self.room.set_timer_remaining(remaining);
        self.broadcast(ServerEvent::Timer { timer: remaining });

        if remaining == 0 {
            self.room.close_question();
            tracing::info!(room = %self.room.code(), "question closed");
            self.broadcast(ServerEvent::Poll { question: None });
        }
    }

    fn handle_end(&mut self) {
        self.countdown.cancel();
        self.broadcast(ServerEvent::End);
        self.registry.release_room(self.room.code());
    }

    fn broadcast_update(&self) {
        self.broadcast(ServerEvent::Update {
            room: self.room.snapshot(),
        });
    }

    fn broadcast(&self, event: ServerEvent) {
        self.registry.broadcast(self.room.code(), &event);
    }
}

/// Spawns a new room actor task and returns a handle to communicate with
/// it. `channel_size` bounds the command queue.
pub(crate) fn spawn_room(
    code: RoomCode,
    admin_name: String,
    registry: Arc<ConnectionRegistry>,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RoomActor {
        room: Room::new(code.clone(), admin_name),
        countdown: Countdown::new(),
        registry,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
