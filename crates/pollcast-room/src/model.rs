//! The room data model and its mutation rules.
//!
//! [`Room`] is plain synchronous state — no channels, no locks. The room
//! actor in `room.rs` owns one and is the only writer, which is what makes
//! these methods safe to keep simple. Keeping the rules here (rather than
//! inline in the actor) lets them be unit-tested without spawning tasks.

use std::collections::HashMap;

use pollcast_protocol::{
    QuestionPayload, QuestionSnapshot, RoomCode, RoomSnapshot,
    StudentSnapshot,
};
use serde_json::Value;

use crate::{RoomError, RoomPhase};

/// One poll prompt and the answers it has collected.
#[derive(Debug, Clone)]
pub(crate) struct Question {
    payload: QuestionPayload,
    responses: HashMap<String, Value>,
}

/// One joined participant.
#[derive(Debug, Clone, Default)]
pub(crate) struct Student {
    /// Answers keyed by question sequence index.
    answers: HashMap<usize, Value>,
}

/// The authoritative state of one poll session.
#[derive(Debug)]
pub(crate) struct Room {
    code: RoomCode,
    admin_name: String,
    /// Append-only; index = question sequence number.
    questions: Vec<Question>,
    students: HashMap<String, Student>,
    current_question: Option<usize>,
    timer_seconds_remaining: u32,
    phase: RoomPhase,
}

impl Room {
    pub(crate) fn new(code: RoomCode, admin_name: String) -> Self {
        Self {
            code,
            admin_name,
            questions: Vec::new(),
            students: HashMap::new(),
            current_question: None,
            timer_seconds_remaining: 0,
            phase: RoomPhase::Idle,
        }
    }

    pub(crate) fn code(&self) -> &RoomCode {
        &self.code
    }

    pub(crate) fn phase(&self) -> RoomPhase {
        self.phase
    }

    /// Adds a participant. The name must be non-empty and not in use by a
    /// live participant; names of departed participants are free again.
    pub(crate) fn join(&mut self, name: &str) -> Result<(), RoomError> {
        if name.trim().is_empty() {
            return Err(RoomError::InvalidInput(
                "display name must not be empty".into(),
            ));
        }
        if self.students.contains_key(name) {
            return Err(RoomError::DuplicateName {
                name: name.to_string(),
                room: self.code.clone(),
            });
        }
        self.students.insert(name.to_string(), Student::default());
        Ok(())
    }

    /// Removes a participant. Returns `false` if the name was not a
    /// member (already departed, or an admin that never was one).
    pub(crate) fn remove_student(&mut self, name: &str) -> bool {
        self.students.remove(name).is_some()
    }

    /// Appends a question, makes it current, and enters Active. Returns
    /// the new question's sequence index.
    pub(crate) fn push_question(
        &mut self,
        payload: QuestionPayload,
    ) -> usize {
        self.timer_seconds_remaining = payload.timer;
        self.questions.push(Question {
            payload,
            responses: HashMap::new(),
        });
        let index = self.questions.len() - 1;
        self.current_question = Some(index);
        self.phase = RoomPhase::Active;
        index
    }

    /// Records an answer against the current question.
    ///
    /// Only mutates state when a question is Active and the participant
    /// exists; otherwise returns `false` and changes nothing. A repeat
    /// answer from the same participant overwrites their earlier one.
    pub(crate) fn record_answer(
        &mut self,
        name: &str,
        answer: Value,
    ) -> bool {
        if !self.phase.is_active() {
            return false;
        }
        let Some(index) = self.current_question else {
            return false;
        };
        let Some(student) = self.students.get_mut(name) else {
            return false;
        };

        student.answers.insert(index, answer.clone());
        self.questions[index]
            .responses
            .insert(name.to_string(), answer);
        true
    }

    /// Updates the remaining-seconds field from a countdown tick.
    pub(crate) fn set_timer_remaining(&mut self, remaining: u32) {
        self.timer_seconds_remaining = remaining;
    }

    /// Closes the current question and returns to Idle. The question
    /// itself stays in `questions`; only `current_question` clears.
    pub(crate) fn close_question(&mut self) {
        self.current_question = None;
        self.timer_seconds_remaining = 0;
        self.phase = RoomPhase::Idle;
    }

    /// Snapshot of the current question for a `poll` broadcast, or `None`
    /// while idle.
    pub(crate) fn current_question_snapshot(
        &self,
    ) -> Option<QuestionSnapshot> {
        self.current_question
            .map(|index| snapshot_question(&self.questions[index]))
    }

    /// Full wire-format snapshot of the room.
    pub(crate) fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            code: self.code.clone(),
            admin_name: self.admin_name.clone(),
            questions: self.questions.iter().map(snapshot_question).collect(),
            students: self
                .students
                .iter()
                .map(|(name, student)| {
                    (
                        name.clone(),
                        StudentSnapshot {
                            answers: student.answers.clone(),
                        },
                    )
                })
                .collect(),
            current_question: self.current_question,
            timer_seconds_remaining: self.timer_seconds_remaining,
        }
    }
}

fn snapshot_question(question: &Question) -> QuestionSnapshot {
    QuestionSnapshot {
        timer: question.payload.timer,
        body: question.payload.body.clone(),
        responses: question.responses.clone(),
    }
}

// =========================================================================
// Tests
// =========================================================================
