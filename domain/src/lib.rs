//! Domain layer for model-arena
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Panel
//!
//! The panel is the fixed, ordered set of model backends that every prompt is
//! dispatched to. Each backend answers independently; the arena scores every
//! answer and declares a winner.
//!
//! ## Scoring
//!
//! Scores are computed by a deterministic heuristic over the response text
//! and latency (see [`scoring`]). Same input, same score - no randomness,
//! no external state.

pub mod backend;
pub mod error;
pub mod prompt;
pub mod request;
pub mod scoring;
pub mod task;

// Re-export commonly used types
pub use backend::{BackendId, BackendSpec, Category, PanelConfig};
pub use error::DomainError;
pub use prompt::Prompt;
pub use request::{ChatRequest, RequestId, RequestStatus};
pub use scoring::{score, ScoreBreakdown};
pub use task::{ModelTask, TaskState};
