//! Progress event types and the per-request fan-out publisher
//!
//! One logical channel per request id. The transport layer (WebSocket, SSE,
//! a CLI renderer) subscribes and receives read-only event values; it holds
//! no ownership over request state.

use arena_domain::{BackendId, RequestId, TaskState};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use tokio::sync::broadcast;

/// Default per-subscriber buffer; slow subscribers past this lag lose
/// intermediate updates, never the stream itself.
const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Events published while a request runs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ArenaEvent {
    /// Emitted on every task state transition
    ModelUpdate {
        request_id: RequestId,
        model: BackendId,
        status: TaskState,
        /// Percentage of panel tasks in a terminal state
        progress: u8,
        #[serde(skip_serializing_if = "Option::is_none")]
        score: Option<u8>,
    },
    /// Emitted exactly once, when every task is terminal
    RequestComplete {
        request_id: RequestId,
        /// Absent when no task completed
        winner_model: Option<BackendId>,
        /// Final score per backend, errored backends included at 0
        all_scores: BTreeMap<String, u8>,
    },
}

/// Fan-out of [`ArenaEvent`]s to zero or more subscribers, per request
///
/// Publishing to a request with no subscribers simply drops the event.
/// Subscribe and publish may race freely; a subscriber only sees events
/// published after it subscribed.
pub struct EventPublisher {
    capacity: usize,
    channels: Mutex<HashMap<RequestId, broadcast::Sender<ArenaEvent>>>,
}

impl EventPublisher {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Open the channel for a request; idempotent
    pub fn register(&self, request_id: RequestId) {
        let mut channels = self.channels.lock().unwrap();
        channels
            .entry(request_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0);
    }

    /// Subscribe to a request's events.
    ///
    /// For an unknown or already-closed request this returns a receiver that
    /// reports the channel as closed, so callers need no special case.
    pub fn subscribe(&self, request_id: &RequestId) -> broadcast::Receiver<ArenaEvent> {
        let channels = self.channels.lock().unwrap();
        match channels.get(request_id) {
            Some(sender) => sender.subscribe(),
            None => broadcast::channel(1).1,
        }
    }

    /// Publish an event to whoever is listening
    pub fn publish(&self, request_id: &RequestId, event: ArenaEvent) {
        let sender = {
            let channels = self.channels.lock().unwrap();
            channels.get(request_id).cloned()
        };
        if let Some(sender) = sender {
            // A send error only means there are no subscribers right now
            let _ = sender.send(event);
        }
    }

    /// Drop the channel for a finished request; subscribers drain buffered
    /// events and then see the stream close
    pub fn close(&self, request_id: &RequestId) {
        self.channels.lock().unwrap().remove(request_id);
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}
