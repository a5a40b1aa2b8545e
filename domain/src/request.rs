//! Chat request entity and winner selection

use crate::backend::{BackendId, PanelConfig};
use crate::error::DomainError;
use crate::prompt::Prompt;
use crate::task::ModelTask;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Opaque unique identifier of a chat request (Value Object)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generate a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Aggregate lifecycle of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Processing,
    Completed,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Processing => "processing",
            RequestStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One prompt evaluated against the full panel (Entity, aggregate root)
///
/// Owns one [`ModelTask`] per panel member, in panel order. Becomes
/// `Completed` exactly once: when the last task reaches a terminal state.
/// The winner is fixed atomically with completion.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    id: RequestId,
    prompt: Prompt,
    created_at: DateTime<Utc>,
    tasks: Vec<ModelTask>,
    status: RequestStatus,
    winner_id: Option<BackendId>,
    total_time: Option<Duration>,
}

impl ChatRequest {
    /// Create a processing request with one pending task per panel member
    pub fn new(id: RequestId, prompt: Prompt, panel: &PanelConfig, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            prompt,
            created_at,
            tasks: panel.iter().map(ModelTask::new).collect(),
            status: RequestStatus::Processing,
            winner_id: None,
            total_time: None,
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn prompt(&self) -> &Prompt {
        &self.prompt
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Tasks in panel order
    pub fn tasks(&self) -> &[ModelTask] {
        &self.tasks
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    /// Winning backend; set only when `status == Completed` and at least one
    /// task completed
    pub fn winner_id(&self) -> Option<&BackendId> {
        self.winner_id.as_ref()
    }

    /// Wall-clock duration from creation to the last terminal transition
    pub fn total_time(&self) -> Option<Duration> {
        self.total_time
    }

    /// Mutable access to the task for one backend
    pub fn task_mut(&mut self, backend: &BackendId) -> Result<&mut ModelTask, DomainError> {
        self.tasks
            .iter_mut()
            .find(|t| t.backend_id() == backend)
            .ok_or_else(|| DomainError::UnknownBackend(backend.to_string()))
    }

    pub fn task(&self, backend: &BackendId) -> Option<&ModelTask> {
        self.tasks.iter().find(|t| t.backend_id() == backend)
    }

    pub fn terminal_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_terminal()).count()
    }

    pub fn all_terminal(&self) -> bool {
        self.terminal_count() == self.tasks.len()
    }

    /// Percentage of tasks in a terminal state, in [0, 100]
    pub fn progress(&self) -> u8 {
        (100 * self.terminal_count() / self.tasks.len()) as u8
    }

    /// Mark the request completed, fixing winner and total time.
    ///
    /// Errors if any task is still running or the request already completed;
    /// both guard the completes-exactly-once invariant.
    pub fn complete(&mut self, total_time: Duration) -> Result<(), DomainError> {
        if self.status == RequestStatus::Completed {
            return Err(DomainError::AlreadyCompleted);
        }
        if !self.all_terminal() {
            return Err(DomainError::TasksStillRunning);
        }
        self.winner_id = select_winner(&self.tasks).map(|t| t.backend_id().clone());
        self.total_time = Some(total_time);
        self.status = RequestStatus::Completed;
        Ok(())
    }
}

/// Pick the winning task: highest score among completed tasks, ties broken
/// by earliest completion, then by panel order.
///
/// Returns `None` when no task completed (a fully-errored request).
pub fn select_winner(tasks: &[ModelTask]) -> Option<&ModelTask> {
    tasks
        .iter()
        .filter(|t| t.is_winner_eligible())
        .reduce(|best, candidate| {
            if candidate.score() > best.score()
                || (candidate.score() == best.score()
                    && candidate.elapsed_time() < best.elapsed_time())
            {
                candidate
            } else {
                best
            }
        })
}
