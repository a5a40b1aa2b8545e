//! Backend client port
//!
//! Defines the interface for sending one prompt to one model backend.
//! Implementations (adapters) live in the infrastructure layer; the
//! dispatcher only sees this trait and the failure taxonomy below.

use arena_domain::BackendId;
use async_trait::async_trait;
use thiserror::Error;

/// Failures a backend call can produce.
///
/// `Timeout`, `RateLimited`, and `Network` are transient and retryable.
/// `Backend` carries the service's status code: client-fault codes (4xx,
/// e.g. an invalid model identifier or an auth failure) are permanent and
/// never retried; server-fault codes are treated as transient.
#[derive(Error, Debug, Clone)]
pub enum BackendClientError {
    #[error("Request timed out")]
    Timeout,

    #[error("Rate limited by backend")]
    RateLimited,

    #[error("Backend error {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),
}

impl BackendClientError {
    /// True for errors the caller itself caused; these are never retried
    pub fn is_client_fault(&self) -> bool {
        matches!(self, BackendClientError::Backend { status, .. } if (400..500).contains(status))
    }

    /// True for transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendClientError::Timeout
            | BackendClientError::RateLimited
            | BackendClientError::Network(_) => true,
            BackendClientError::Backend { .. } => !self.is_client_fault(),
        }
    }
}

/// A successful backend response
#[derive(Debug, Clone)]
pub struct BackendReply {
    /// Response text; may be empty when the backend returned no usable content
    pub content: String,
}

impl BackendReply {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Client for one opaque network backend service
///
/// Implementations must be safe to share across concurrently running
/// dispatchers; the dispatcher applies its own per-attempt timeout around
/// `send`.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Send a prompt to the given backend and return its response text
    async fn send(&self, backend: &BackendId, prompt: &str)
        -> Result<BackendReply, BackendClientError>;
}
