//! Per-backend unit of work and its state machine

use crate::backend::{BackendId, BackendSpec, Category};
use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lifecycle state of a [`ModelTask`]
///
/// Transitions are monotonic along `Pending -> Processing -> {Completed | Error}`.
/// `Completed` and `Error` are terminal; no transition leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    Processing,
    Completed,
    Error,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Processing => "processing",
            TaskState::Completed => "completed",
            TaskState::Error => "error",
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One backend's unit of work within a request (Entity)
///
/// Owned exclusively by its [`crate::ChatRequest`]; mutated only through the
/// transition methods, which enforce the state machine.
#[derive(Debug, Clone)]
pub struct ModelTask {
    backend_id: BackendId,
    display_name: String,
    category: Category,
    state: TaskState,
    attempt_count: u32,
    response_text: Option<String>,
    error_detail: Option<String>,
    elapsed_time: Duration,
    score: u8,
}

impl ModelTask {
    /// Create a pending task for one panel member
    pub fn new(spec: &BackendSpec) -> Self {
        Self {
            backend_id: spec.id.clone(),
            display_name: spec.display_name.clone(),
            category: spec.category,
            state: TaskState::Pending,
            attempt_count: 0,
            response_text: None,
            error_detail: None,
            elapsed_time: Duration::ZERO,
            score: 0,
        }
    }

    pub fn backend_id(&self) -> &BackendId {
        &self.backend_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    /// Response text; present only when `state == Completed`
    pub fn response_text(&self) -> Option<&str> {
        self.response_text.as_deref()
    }

    /// Error detail; present only when `state == Error`
    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    pub fn elapsed_time(&self) -> Duration {
        self.elapsed_time
    }

    /// Score in [0, 100]; an errored task always scores 0
    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Only completed tasks may win
    pub fn is_winner_eligible(&self) -> bool {
        self.state == TaskState::Completed
    }

    /// Transition `Pending -> Processing`; the first attempt is underway, so
    /// a dispatched task never reports zero attempts
    pub fn start(&mut self) -> Result<(), DomainError> {
        if self.state != TaskState::Pending {
            return Err(self.invalid_transition(TaskState::Processing));
        }
        self.state = TaskState::Processing;
        self.attempt_count = 1;
        Ok(())
    }

    /// Transition `Processing -> Completed`, recording the response and score
    pub fn complete(
        &mut self,
        response_text: String,
        elapsed_time: Duration,
        attempt_count: u32,
        score: u8,
    ) -> Result<(), DomainError> {
        if self.state != TaskState::Processing {
            return Err(self.invalid_transition(TaskState::Completed));
        }
        self.state = TaskState::Completed;
        self.response_text = Some(response_text);
        self.elapsed_time = elapsed_time;
        self.attempt_count = attempt_count;
        self.score = score.min(100);
        Ok(())
    }

    /// Transition `Processing -> Error`, recording the failure
    pub fn fail(
        &mut self,
        error_detail: String,
        elapsed_time: Duration,
        attempt_count: u32,
    ) -> Result<(), DomainError> {
        if self.state != TaskState::Processing {
            return Err(self.invalid_transition(TaskState::Error));
        }
        self.state = TaskState::Error;
        self.error_detail = Some(error_detail);
        self.elapsed_time = elapsed_time;
        self.attempt_count = attempt_count;
        self.score = 0;
        Ok(())
    }

    fn invalid_transition(&self, to: TaskState) -> DomainError {
        DomainError::InvalidTaskTransition { from: self.state, to }
    }
}
