//! Caller-facing failures.
//!
//! Invalid answers are never errors: they become messages through the sink.
//! [`EngineError`] is reserved for caller mistakes and broken question
//! definitions.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// `answer` called before `start`.
    #[error("conversation has not been started")]
    NotStarted,

    /// `start` or `register` called on a running or finished conversation.
    #[error("conversation has already been started")]
    AlreadyStarted,

    /// `answer` called after the flow completed.
    #[error("conversation is already complete")]
    Complete,

    #[error("question name must not be empty")]
    EmptyName,

    #[error("question '{0}' is already registered")]
    DuplicateQuestion(String),

    #[error("question '{0}' is not registered")]
    UnknownQuestion(String),

    /// The registered graph failed its structural checks.
    #[error("invalid flow:\n- {}", .0.join("\n- "))]
    InvalidFlow(Vec<String>),

    /// A question's parser rejected input its own checks accepted.
    #[error("question '{question}' accepted {input:?} but could not parse it: {reason}")]
    Coercion {
        question: String,
        input: String,
        reason: String,
    },

    #[error("confirmation template: {0}")]
    Template(String),
}
