//! Request registry
//!
//! Process-wide table of in-flight and completed requests. An explicit
//! service object with injected dependencies (clock, backend client, event
//! publisher) - constructed once at process start, no module-level state.

use crate::aggregator::ProgressAggregator;
use crate::dispatch::{dispatch, DispatchConfig};
use crate::events::{ArenaEvent, EventPublisher};
use crate::ports::backend_client::BackendClient;
use crate::ports::clock::Clock;
use crate::snapshot::{RequestResult, StatusSnapshot};
use arena_domain::{ChatRequest, PanelConfig, Prompt, RequestId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};
use tracing::info;

/// Request-level failures surfaced to callers
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Prompt must not be empty")]
    InvalidInput,

    #[error("Unknown request id: {0}")]
    NotFound(RequestId),
}

/// Creates, looks up, and evicts chat requests
///
/// `create` spawns one dispatcher task per panel member plus one aggregator
/// task; everything else is a non-blocking read of the registry table.
pub struct RequestRegistry {
    panel: PanelConfig,
    dispatch_config: DispatchConfig,
    client: Arc<dyn BackendClient>,
    clock: Arc<dyn Clock>,
    publisher: Arc<EventPublisher>,
    /// Admission gate bounding concurrently running dispatchers
    gate: Arc<Semaphore>,
    requests: RwLock<HashMap<RequestId, Arc<Mutex<ChatRequest>>>>,
}

impl RequestRegistry {
    pub fn new(
        panel: PanelConfig,
        dispatch_config: DispatchConfig,
        client: Arc<dyn BackendClient>,
        clock: Arc<dyn Clock>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            panel,
            dispatch_config,
            client,
            clock,
            publisher: Arc::new(EventPublisher::default()),
            gate: Arc::new(Semaphore::new(max_concurrent.max(1))),
            requests: RwLock::new(HashMap::new()),
        }
    }

    pub fn panel(&self) -> &PanelConfig {
        &self.panel
    }

    /// Create a request and start processing it against the whole panel.
    ///
    /// Rejects an empty prompt before any task exists. Returns as soon as the
    /// dispatchers are spawned; callers follow progress via [`subscribe`],
    /// [`get_status`], or [`get_result`].
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// [`subscribe`]: RequestRegistry::subscribe
    /// [`get_status`]: RequestRegistry::get_status
    /// [`get_result`]: RequestRegistry::get_result
    pub fn create(&self, prompt: &str) -> Result<RequestId, RegistryError> {
        let prompt = Prompt::parse(prompt).map_err(|_| RegistryError::InvalidInput)?;
        let request_id = RequestId::new();

        let request = Arc::new(Mutex::new(ChatRequest::new(
            request_id,
            prompt.clone(),
            &self.panel,
            self.clock.now(),
        )));
        self.requests
            .write()
            .unwrap()
            .insert(request_id, Arc::clone(&request));
        self.publisher.register(request_id);

        info!(request_id = %request_id, models = self.panel.len(), "created request");

        let (events_tx, events_rx) = mpsc::channel(self.panel.len() * 2 + 1);
        let aggregator = ProgressAggregator::new(request, Arc::clone(&self.publisher));
        tokio::spawn(aggregator.run(events_rx));

        for spec in self.panel.iter() {
            let backend = spec.id.clone();
            let prompt = prompt.content().to_string();
            let client = Arc::clone(&self.client);
            let config = self.dispatch_config.clone();
            let events = events_tx.clone();
            let gate = Arc::clone(&self.gate);

            tokio::spawn(async move {
                // Tasks past the concurrency limit stay pending here
                let Ok(_permit) = gate.acquire_owned().await else {
                    return;
                };
                dispatch(backend, prompt, client, config, events).await;
            });
        }

        Ok(request_id)
    }

    /// Progress snapshot; never blocks on in-flight work
    pub fn get_status(&self, request_id: RequestId) -> Result<StatusSnapshot, RegistryError> {
        let request = self.lookup(request_id)?;
        let request = request.lock().unwrap();
        Ok(StatusSnapshot::from_request(&request))
    }

    /// Full result; partial while the request is still processing
    pub fn get_result(&self, request_id: RequestId) -> Result<RequestResult, RegistryError> {
        let request = self.lookup(request_id)?;
        let request = request.lock().unwrap();
        Ok(RequestResult::from_request(&request))
    }

    /// Subscribe to the request's progress events.
    ///
    /// A request that already completed yields a receiver that reports the
    /// stream as closed.
    pub fn subscribe(
        &self,
        request_id: RequestId,
    ) -> Result<tokio::sync::broadcast::Receiver<ArenaEvent>, RegistryError> {
        self.lookup(request_id)?;
        Ok(self.publisher.subscribe(&request_id))
    }

    /// Evict a request; hook for an external housekeeping/retention policy.
    ///
    /// In-flight dispatch work is not cancelled; it runs to completion against
    /// the request handle it already holds.
    pub fn remove(&self, request_id: RequestId) -> Result<(), RegistryError> {
        let removed = self.requests.write().unwrap().remove(&request_id);
        if removed.is_none() {
            return Err(RegistryError::NotFound(request_id));
        }
        self.publisher.close(&request_id);
        Ok(())
    }

    /// Number of requests currently held, in-flight and completed
    pub fn len(&self) -> usize {
        self.requests.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, request_id: RequestId) -> Result<Arc<Mutex<ChatRequest>>, RegistryError> {
        self.requests
            .read()
            .unwrap()
            .get(&request_id)
            .cloned()
            .ok_or(RegistryError::NotFound(request_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::backend_client::{BackendClientError, BackendReply};
    use arena_domain::{BackendId, BackendSpec, Category, RequestStatus, TaskState};
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use std::collections::VecDeque;
    use std::time::Duration;
    use tokio::sync::broadcast;
    use tokio::time::sleep;

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
        }
    }

    type Step = (Duration, Result<BackendReply, BackendClientError>);

    /// Per-backend scripts: each call pops the next step, waits its latency,
    /// and returns its outcome
    struct ScriptedPanelClient {
        scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    }

    impl ScriptedPanelClient {
        fn new(scripts: Vec<(&str, Vec<Step>)>) -> Arc<Self> {
            Arc::new(Self {
                scripts: Mutex::new(
                    scripts
                        .into_iter()
                        .map(|(id, steps)| (id.to_string(), steps.into()))
                        .collect(),
                ),
            })
        }
    }

    #[async_trait]
    impl BackendClient for ScriptedPanelClient {
        async fn send(
            &self,
            backend: &BackendId,
            _prompt: &str,
        ) -> Result<BackendReply, BackendClientError> {
            let step = self
                .scripts
                .lock()
                .unwrap()
                .get_mut(backend.as_str())
                .and_then(|q| q.pop_front());
            match step {
                Some((latency, outcome)) => {
                    sleep(latency).await;
                    outcome
                }
                None => Err(BackendClientError::Network("unscripted call".to_string())),
            }
        }
    }

    fn panel(ids: &[&str]) -> PanelConfig {
        PanelConfig::new(
            ids.iter()
                .map(|id| BackendSpec::new(*id, id.to_uppercase(), Category::Free))
                .collect(),
        )
        .unwrap()
    }

    fn registry(
        panel: PanelConfig,
        client: Arc<dyn BackendClient>,
        timeout_s: u64,
        max_retries: u32,
    ) -> RequestRegistry {
        let config = DispatchConfig {
            request_timeout: Duration::from_secs(timeout_s),
            max_retries,
            ..DispatchConfig::default()
        };
        RequestRegistry::new(panel, config, client, Arc::new(FixedClock), 10)
    }

    /// Collect every event up to and including RequestComplete
    async fn drain(mut rx: broadcast::Receiver<ArenaEvent>) -> Vec<ArenaEvent> {
        let mut events = Vec::new();
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let done = matches!(event, ArenaEvent::RequestComplete { .. });
                    events.push(event);
                    if done {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
                Err(broadcast::error::RecvError::Lagged(_)) => {}
            }
        }
        events
    }

    fn words(n: usize) -> String {
        "one two three four five six seven eight nine ten. ".repeat(n / 10).trim().to_string()
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected_before_any_dispatch() {
        let client = ScriptedPanelClient::new(vec![]);
        let registry = registry(panel(&["a"]), client, 5, 2);

        assert!(matches!(registry.create("   "), Err(RegistryError::InvalidInput)));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let client = ScriptedPanelClient::new(vec![]);
        let registry = registry(panel(&["a"]), client, 5, 2);
        let bogus = RequestId::new();

        assert!(matches!(registry.get_status(bogus), Err(RegistryError::NotFound(_))));
        assert!(matches!(registry.get_result(bogus), Err(RegistryError::NotFound(_))));
        assert!(matches!(registry.subscribe(bogus), Err(RegistryError::NotFound(_))));
        assert!(matches!(registry.remove(bogus), Err(RegistryError::NotFound(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_backend_scenario() {
        // A answers 50 words in 2s; B times out twice then answers 10 words
        // in 4s; C hits a permanent auth error
        let client = ScriptedPanelClient::new(vec![
            ("a", vec![(Duration::from_secs(2), Ok(BackendReply::new(words(50))))]),
            (
                "b",
                vec![
                    (Duration::ZERO, Err(BackendClientError::Timeout)),
                    (Duration::ZERO, Err(BackendClientError::Timeout)),
                    (Duration::from_secs(4), Ok(BackendReply::new(words(10)))),
                ],
            ),
            (
                "c",
                vec![(
                    Duration::ZERO,
                    Err(BackendClientError::Backend {
                        status: 401,
                        message: "auth failure".to_string(),
                    }),
                )],
            ),
        ]);
        let registry = registry(panel(&["a", "b", "c"]), client, 5, 2);

        let id = registry.create("compare these models").unwrap();
        let events = drain(registry.subscribe(id).unwrap()).await;

        // Exactly one completion, carrying all three scores
        match events.last().unwrap() {
            ArenaEvent::RequestComplete {
                winner_model,
                all_scores,
                ..
            } => {
                assert_eq!(winner_model.as_ref().unwrap().as_str(), "a");
                assert_eq!(all_scores.len(), 3);
                assert_eq!(all_scores["c"], 0);
                assert!(all_scores["a"] > all_scores["b"]);
            }
            other => panic!("expected RequestComplete, got {other:?}"),
        }

        let status = registry.get_status(id).unwrap();
        assert_eq!(status.status, RequestStatus::Completed);
        assert_eq!(status.progress, 100);
        let by_id = |id: &str| status.models.iter().find(|m| m.backend_id.as_str() == id).unwrap();
        assert_eq!(by_id("a").attempt_count, 1);
        assert_eq!(by_id("b").attempt_count, 3);
        assert_eq!(by_id("c").attempt_count, 1);
        assert_eq!(by_id("c").state, TaskState::Error);

        let result = registry.get_result(id).unwrap();
        assert_eq!(result.winner_id.as_ref().unwrap().as_str(), "a");
        assert_eq!(result.winner_display_name.as_deref(), Some("A"));
        let a = &result.results[0];
        let b = &result.results[1];
        let c = &result.results[2];
        // A: full content credit, high speed credit
        assert!(a.score >= 85);
        assert_eq!(a.elapsed_seconds, 2.0);
        // B: reduced content, speed near zero
        assert!(b.score < a.score);
        assert_eq!(b.elapsed_seconds, 4.0);
        // C: errored, score 0, detail preserved
        assert_eq!(c.score, 0);
        assert!(c.error_detail.as_deref().unwrap().contains("auth failure"));
        assert!(c.response_text.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retryable_exhaustion_attempt_count() {
        let steps: Vec<Step> = (0..3)
            .map(|_| (Duration::ZERO, Err(BackendClientError::RateLimited)))
            .collect();
        let client = ScriptedPanelClient::new(vec![("a", steps)]);
        let registry = registry(panel(&["a"]), client, 5, 2);

        let id = registry.create("q").unwrap();
        drain(registry.subscribe(id).unwrap()).await;

        let status = registry.get_status(id).unwrap();
        assert_eq!(status.models[0].state, TaskState::Error);
        assert_eq!(status.models[0].attempt_count, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fully_errored_request_completes_without_winner() {
        let fail: Step = (
            Duration::ZERO,
            Err(BackendClientError::Backend {
                status: 400,
                message: "invalid model".to_string(),
            }),
        );
        let client =
            ScriptedPanelClient::new(vec![("a", vec![fail.clone()]), ("b", vec![fail])]);
        let registry = registry(panel(&["a", "b"]), client, 5, 0);

        let id = registry.create("q").unwrap();
        let events = drain(registry.subscribe(id).unwrap()).await;

        match events.last().unwrap() {
            ArenaEvent::RequestComplete { winner_model, .. } => assert!(winner_model.is_none()),
            other => panic!("expected RequestComplete, got {other:?}"),
        }

        let result = registry.get_result(id).unwrap();
        assert_eq!(result.status, RequestStatus::Completed);
        assert!(result.winner_id.is_none());
        assert!(result
            .results
            .iter()
            .all(|r| r.state == TaskState::Error && r.error_detail.is_some()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_progress_is_monotonic() {
        let client = ScriptedPanelClient::new(vec![
            ("a", vec![(Duration::from_secs(1), Ok(BackendReply::new(words(20))))]),
            ("b", vec![(Duration::from_secs(2), Ok(BackendReply::new(words(20))))]),
            ("c", vec![(Duration::from_secs(3), Ok(BackendReply::new(words(20))))]),
        ]);
        let registry = registry(panel(&["a", "b", "c"]), client, 10, 0);

        let id = registry.create("q").unwrap();
        let events = drain(registry.subscribe(id).unwrap()).await;

        let mut last = 0u8;
        for event in &events {
            if let ArenaEvent::ModelUpdate { progress, .. } = event {
                assert!(*progress >= last, "progress regressed");
                last = *progress;
            }
        }
        assert_eq!(last, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_is_partial_while_processing() {
        let client = ScriptedPanelClient::new(vec![(
            "a",
            vec![(Duration::from_secs(60), Ok(BackendReply::new(words(20))))],
        )]);
        let registry = registry(panel(&["a"]), client, 120, 0);

        let id = registry.create("q").unwrap();
        // No await on completion: query immediately
        let result = registry.get_result(id).unwrap();
        assert_eq!(result.status, RequestStatus::Processing);
        assert!(result.winner_id.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_while_processing_reports_first_attempt() {
        let client = ScriptedPanelClient::new(vec![(
            "a",
            vec![(Duration::from_secs(60), Ok(BackendReply::new(words(20))))],
        )]);
        let registry = registry(panel(&["a"]), client, 120, 0);

        let id = registry.create("q").unwrap();
        // Let the dispatcher start its first attempt, well short of the reply
        sleep(Duration::from_secs(1)).await;

        let status = registry.get_status(id).unwrap();
        assert_eq!(status.models[0].state, TaskState::Processing);
        assert_eq!(status.models[0].attempt_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_evicts_request() {
        let client = ScriptedPanelClient::new(vec![(
            "a",
            vec![(Duration::ZERO, Ok(BackendReply::new(words(20))))],
        )]);
        let registry = registry(panel(&["a"]), client, 5, 0);

        let id = registry.create("q").unwrap();
        drain(registry.subscribe(id).unwrap()).await;

        registry.remove(id).unwrap();
        assert!(matches!(registry.get_status(id), Err(RegistryError::NotFound(_))));
        assert!(registry.is_empty());
    }
}
