//! Error types for session operations.

use thiserror::Error;

use crate::state::SessionPhase;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that can occur while driving a drawing session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The event is not accepted in the current phase.
    #[error("{event} is not allowed while {phase}")]
    InvalidTransition {
        /// Name of the rejected event.
        event: &'static str,
        /// Phase the session was in.
        phase: SessionPhase,
    },

    /// The session already reached `Leaving`; late completions are discarded.
    #[error("session for project '{0}' has ended")]
    Closed(String),

    /// A 1-based class index outside the label set.
    #[error("class index {index} is out of range (expected 1..={count})")]
    ClassIndex {
        /// The requested index.
        index: usize,
        /// Number of labels in the session.
        count: usize,
    },

    /// A project form failed local validation.
    #[error("{0}")]
    Validation(String),
}
