//! Model dispatcher
//!
//! Drives exactly one model task to a terminal state: applies the per-attempt
//! timeout, retries transient failures with exponential backoff, scores the
//! response on success, and reports every transition to the owning aggregator
//! through a typed event channel.

use crate::ports::backend_client::{BackendClient, BackendClientError};
use arena_domain::{scoring, BackendId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

/// Timeout, retry, and backoff knobs for one dispatch
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Budget for a single attempt; also the scoring reference
    pub request_timeout: Duration,
    /// Extra attempts after the first, for retryable failures only
    pub max_retries: u32,
    /// First backoff delay; doubles per attempt
    pub backoff_base: Duration,
    /// Upper bound on a single backoff delay
    pub backoff_cap: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_retries: 2,
            backoff_base: Duration::from_millis(500),
            backoff_cap: Duration::from_secs(8),
        }
    }
}

impl DispatchConfig {
    /// Delay before the attempt following `attempt`: `base * 2^(attempt-1)`, capped
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(exponent))
            .min(self.backoff_cap)
    }
}

/// Task state transitions, as reported by a dispatcher to its aggregator
#[derive(Debug)]
pub enum TaskEvent {
    /// `Pending -> Processing`; sent once, before the first attempt
    Started { backend: BackendId },
    /// `Processing -> Completed` with the scored response
    Completed {
        backend: BackendId,
        response_text: String,
        /// Duration of the successful attempt
        elapsed: Duration,
        attempts: u32,
        score: u8,
    },
    /// `Processing -> Error` after a permanent failure or exhausted retries
    Failed {
        backend: BackendId,
        detail: String,
        /// Duration across all attempts, backoff included
        elapsed: Duration,
        attempts: u32,
    },
}

/// Drive one backend's task to a terminal state.
///
/// Every transition is delivered to the aggregator channel before the
/// dispatcher proceeds. The dispatcher owns no shared state; any number may
/// run concurrently for the same request.
pub async fn dispatch(
    backend: BackendId,
    prompt: String,
    client: Arc<dyn BackendClient>,
    config: DispatchConfig,
    events: mpsc::Sender<TaskEvent>,
) {
    let started = TaskEvent::Started {
        backend: backend.clone(),
    };
    if events.send(started).await.is_err() {
        warn!(model = %backend, "aggregator gone before dispatch started");
        return;
    }

    let dispatch_start = Instant::now();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let attempt_start = Instant::now();
        debug!(model = %backend, attempt = attempts, "sending request");

        let outcome = match timeout(config.request_timeout, client.send(&backend, &prompt)).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(BackendClientError::Timeout),
        };

        match outcome {
            Ok(reply) => {
                let elapsed = attempt_start.elapsed();
                let (score, breakdown) =
                    scoring::score(&reply.content, elapsed, config.request_timeout);
                debug!(
                    model = %backend,
                    content = breakdown.content_score,
                    speed = breakdown.speed_score,
                    coherence = breakdown.coherence_score,
                    "scored response"
                );
                info!(
                    model = %backend,
                    score,
                    attempts,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "model completed"
                );
                let _ = events
                    .send(TaskEvent::Completed {
                        backend,
                        response_text: reply.content,
                        elapsed,
                        attempts,
                        score,
                    })
                    .await;
                return;
            }
            Err(e) if e.is_retryable() && attempts <= config.max_retries => {
                let delay = config.backoff_delay(attempts);
                warn!(
                    model = %backend,
                    attempt = attempts,
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "retryable failure, backing off"
                );
                sleep(delay).await;
            }
            Err(e) => {
                warn!(model = %backend, attempts, error = %e, "model failed");
                let _ = events
                    .send(TaskEvent::Failed {
                        backend,
                        detail: e.to_string(),
                        elapsed: dispatch_start.elapsed(),
                        attempts,
                    })
                    .await;
                return;
            }
        }
    }
}
