//! Progress aggregator
//!
//! One aggregator task per request consumes the typed transition events
//! published by that request's dispatchers. Being the channel's single
//! consumer is what linearizes the tally: concurrent dispatchers can never
//! race on progress or on the exactly-once completion event.

use crate::dispatch::TaskEvent;
use crate::events::{ArenaEvent, EventPublisher};
use arena_domain::{ChatRequest, DomainError, RequestId, TaskState};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{info, warn};

/// Owns the terminal/non-terminal tally for one request and publishes progress
pub struct ProgressAggregator {
    request: Arc<Mutex<ChatRequest>>,
    publisher: Arc<EventPublisher>,
    /// Monotonic start of the request, for `total_time`
    started: Instant,
}

impl ProgressAggregator {
    pub fn new(request: Arc<Mutex<ChatRequest>>, publisher: Arc<EventPublisher>) -> Self {
        Self {
            request,
            publisher,
            started: Instant::now(),
        }
    }

    /// Consume transition events until every task is terminal, then close the
    /// request's event channel.
    ///
    /// An event that violates the task state machine is logged and dropped;
    /// the request keeps making progress on the remaining tasks.
    pub async fn run(self, mut events: mpsc::Receiver<TaskEvent>) {
        let request_id = self.request.lock().unwrap().id();

        while let Some(event) = events.recv().await {
            match self.apply(request_id, event) {
                Ok(true) => break,
                Ok(false) => {}
                Err(e) => warn!(request_id = %request_id, error = %e, "dropped task event"),
            }
        }

        self.publisher.close(&request_id);
    }

    /// Apply one transition under the request lock. Returns `Ok(true)` once
    /// the request has completed.
    fn apply(&self, request_id: RequestId, event: TaskEvent) -> Result<bool, DomainError> {
        let mut request = self.request.lock().unwrap();

        let (backend, status, score) = match event {
            TaskEvent::Started { backend } => {
                request.task_mut(&backend)?.start()?;
                (backend, TaskState::Processing, None)
            }
            TaskEvent::Completed {
                backend,
                response_text,
                elapsed,
                attempts,
                score,
            } => {
                request
                    .task_mut(&backend)?
                    .complete(response_text, elapsed, attempts, score)?;
                (backend, TaskState::Completed, Some(score))
            }
            TaskEvent::Failed {
                backend,
                detail,
                elapsed,
                attempts,
            } => {
                request.task_mut(&backend)?.fail(detail, elapsed, attempts)?;
                (backend, TaskState::Error, None)
            }
        };

        let progress = request.progress();
        self.publisher.publish(
            &request_id,
            ArenaEvent::ModelUpdate {
                request_id,
                model: backend,
                status,
                progress,
                score,
            },
        );

        if !request.all_terminal() {
            return Ok(false);
        }

        request.complete(self.started.elapsed())?;
        let winner_model = request.winner_id().cloned();
        let all_scores = request
            .tasks()
            .iter()
            .map(|t| (t.backend_id().to_string(), t.score()))
            .collect();

        info!(
            request_id = %request_id,
            winner = winner_model.as_ref().map(|w| w.as_str()).unwrap_or("none"),
            total_ms = self.started.elapsed().as_millis() as u64,
            "request completed"
        );
        self.publisher.publish(
            &request_id,
            ArenaEvent::RequestComplete {
                request_id,
                winner_model,
                all_scores,
            },
        );
        Ok(true)
    }
}
