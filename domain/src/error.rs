//! Domain error types

use crate::task::TaskState;
use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Prompt must not be empty")]
    EmptyPrompt,

    #[error("Panel must contain at least one backend")]
    EmptyPanel,

    #[error("Duplicate backend id in panel: {0}")]
    DuplicateBackend(String),

    #[error("Invalid task transition: {from} -> {to}")]
    InvalidTaskTransition { from: TaskState, to: TaskState },

    #[error("Unknown backend in request: {0}")]
    UnknownBackend(String),

    #[error("Request is already completed")]
    AlreadyCompleted,

    #[error("Request cannot complete while tasks are still running")]
    TasksStillRunning,
}
