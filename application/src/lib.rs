//! Application layer for model-arena
//!
//! This crate contains the orchestration engine: the per-backend dispatcher,
//! the per-request progress aggregator, the event publisher, the request
//! registry, and the ports it drives them through. It depends only on the
//! domain layer.

pub mod aggregator;
pub mod dispatch;
pub mod events;
pub mod ports;
pub mod registry;
pub mod snapshot;

// Re-export commonly used types
pub use aggregator::ProgressAggregator;
pub use dispatch::{dispatch, DispatchConfig, TaskEvent};
pub use events::{ArenaEvent, EventPublisher};
pub use ports::{
    backend_client::{BackendClient, BackendClientError, BackendReply},
    clock::Clock,
};
pub use registry::{RegistryError, RequestRegistry};
pub use snapshot::{RequestResult, StatusSnapshot, TaskResultEntry, TaskStatusEntry};
