//! The question lifecycle state machine.

/// Whether a room currently has a question accepting answers.
///
/// ```text
/// Idle ──(push question)──→ Active ──(countdown expires)──→ Idle
///                             │
///                             └──(new question pushed)──→ Active
/// ```
///
/// - **Idle**: no current question. Answers are ignored.
/// - **Active**: one question is accepting answers and its countdown is
///   running. Pushing another question stays Active but preempts the
///   countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoomPhase {
    /// No question is accepting answers.
    #[default]
    Idle,
    /// The current question is accepting answers.
    Active,
}

impl RoomPhase {
    /// Returns `true` if a question is currently accepting answers.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Active => write!(f, "Active"),
        }
    }
}
