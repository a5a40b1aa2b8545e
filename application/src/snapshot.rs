//! Read-only views of a request, for status and result queries
//!
//! These are the shapes the transport layer serializes directly; the
//! entities themselves never leave the registry.

use arena_domain::{BackendId, Category, ChatRequest, RequestId, RequestStatus, TaskState};
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-backend state, as returned by a status query
#[derive(Debug, Clone, Serialize)]
pub struct TaskStatusEntry {
    pub backend_id: BackendId,
    pub display_name: String,
    pub category: Category,
    pub state: TaskState,
    pub attempt_count: u32,
}

/// Lightweight progress view of one request
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub request_id: RequestId,
    pub status: RequestStatus,
    /// Percentage of panel tasks in a terminal state
    pub progress: u8,
    /// Panel order
    pub models: Vec<TaskStatusEntry>,
}

impl StatusSnapshot {
    pub fn from_request(request: &ChatRequest) -> Self {
        Self {
            request_id: request.id(),
            status: request.status(),
            progress: request.progress(),
            models: request
                .tasks()
                .iter()
                .map(|t| TaskStatusEntry {
                    backend_id: t.backend_id().clone(),
                    display_name: t.display_name().to_string(),
                    category: t.category(),
                    state: t.state(),
                    attempt_count: t.attempt_count(),
                })
                .collect(),
        }
    }
}

/// One backend's final (or in-flight) outcome
#[derive(Debug, Clone, Serialize)]
pub struct TaskResultEntry {
    pub backend_id: BackendId,
    pub display_name: String,
    pub category: Category,
    pub state: TaskState,
    pub score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    pub elapsed_seconds: f64,
}

/// Full result of a request.
///
/// Well-formed at any time: while the request is still processing the
/// caller simply sees partial data and no winner.
#[derive(Debug, Clone, Serialize)]
pub struct RequestResult {
    pub request_id: RequestId,
    pub prompt: String,
    pub status: RequestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner_id: Option<BackendId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner_display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_seconds: Option<f64>,
    /// Panel order
    pub results: Vec<TaskResultEntry>,
    /// Final score per backend, errored backends included at 0
    pub all_scores: BTreeMap<String, u8>,
}

impl RequestResult {
    pub fn from_request(request: &ChatRequest) -> Self {
        let winner_display_name = request
            .winner_id()
            .and_then(|id| request.task(id))
            .map(|t| t.display_name().to_string());

        Self {
            request_id: request.id(),
            prompt: request.prompt().content().to_string(),
            status: request.status(),
            winner_id: request.winner_id().cloned(),
            winner_display_name,
            total_seconds: request.total_time().map(|d| d.as_secs_f64()),
            results: request
                .tasks()
                .iter()
                .map(|t| TaskResultEntry {
                    backend_id: t.backend_id().clone(),
                    display_name: t.display_name().to_string(),
                    category: t.category(),
                    state: t.state(),
                    score: t.score(),
                    response_text: t.response_text().map(str::to_string),
                    error_detail: t.error_detail().map(str::to_string),
                    elapsed_seconds: t.elapsed_time().as_secs_f64(),
                })
                .collect(),
            all_scores: request
                .tasks()
                .iter()
                .map(|t| (t.backend_id().to_string(), t.score()))
                .collect(),
        }
    }
}
