//! Error types shared across the quiz engine.
//!
//! Persistence and notification failures are recovered locally by their
//! callers; these types exist so the recovery code can log and classify them
//! without string matching.

use thiserror::Error;

use crate::model::QuestionId;

/// A read or write against the local key/value store failed.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying filesystem operation failed.
    #[error("storage I/O failed for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The in-memory store lock was poisoned by a panicking writer.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Persisted state could not be turned back into a usable value.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The store itself failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The stored value did not match the expected schema.
    #[error("malformed persisted state under '{key}': {reason}")]
    Malformed { key: String, reason: String },
}

/// Rejected session operations. The session is never modified when one of
/// these is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session has not been started")]
    NotStarted,

    #[error("session is already completed")]
    AlreadyCompleted,

    /// The referenced question id is not part of the loaded bank.
    #[error("unknown question reference: {0}")]
    UnknownQuestion(QuestionId),

    #[error("question {0} is not a choice question")]
    NotAChoiceQuestion(QuestionId),

    #[error("question {0} is not a coding question")]
    NotACodingQuestion(QuestionId),

    #[error("option {option} out of range for question {question} ({available} options)")]
    OptionOutOfRange {
        question: QuestionId,
        option: usize,
        available: usize,
    },
}

/// An encoded answer index that cannot have been produced by the codec.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("invalid encoded answer index: {0}")]
    InvalidEncoding(u32),
}

/// Errors raised by a notification gateway.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The delivery service returned a 429 response.
    #[error("delivery service rate limited the request")]
    RateLimited,

    /// The delivery service rejected the report.
    #[error("delivery rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The request timed out.
    #[error("delivery timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// The gateway is not configured well enough to send anything.
    #[error("gateway misconfigured: {0}")]
    Misconfigured(String),
}

impl NotificationError {
    /// Returns `true` if retrying the same report cannot succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            NotificationError::Misconfigured(_)
                | NotificationError::Rejected {
                    status: 400..=499,
                    ..
                }
        )
    }
}
