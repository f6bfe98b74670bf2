//! Error types for the task list.
//!
//! [`ClarityError`] is what the planner and store hand back to callers. The
//! narrower enums below it belong to one concern each and convert into it
//! with `?`. None of them is fatal to a session.

use thiserror::Error;

use crate::anthropic::AnthropicError;

/// Top-level error for task operations.
#[derive(Debug, Error)]
pub enum ClarityError {
    /// The input was rejected before any task was created or changed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The persisted slot could not be read or written.
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// An estimation call produced nothing usable. The task itself is kept.
    #[error("Estimation unavailable: {0}")]
    EstimationUnavailable(#[from] EstimationError),

    /// No task has this id, or the id prefix matched nothing.
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// An id prefix matched several tasks.
    #[error("Task id prefix `{0}` matches more than one task")]
    AmbiguousId(String),

    /// `add_task` was called while another add was still awaiting its
    /// estimates.
    #[error("A task submission is already in progress")]
    SubmissionInFlight,
}

/// Rejections raised before a task is constructed or edited.
///
/// The messages are shown verbatim next to the offending input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Fewer than `min` characters once trimmed.
    #[error("Task description must be at least {min} characters.")]
    DescriptionTooShort { min: usize },

    /// A due time was given with no due date to attach it to.
    #[error("A date is required when a time is set.")]
    TimeWithoutDate,
}

/// Failures reading or writing the task slot.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The backend could not reach its storage.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The task list could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a best-effort estimation call produced nothing usable.
#[derive(Debug, Error)]
pub enum EstimationError {
    /// The request never produced a reply (network, status, timeout).
    #[error("model request failed: {0}")]
    Transport(#[from] AnthropicError),

    /// The reply held no JSON object, or not the expected fields.
    #[error("malformed model response: {0}")]
    Malformed(String),

    /// A field parsed but its value is out of range.
    #[error("model returned an invalid value: {0}")]
    InvalidValue(String),
}
