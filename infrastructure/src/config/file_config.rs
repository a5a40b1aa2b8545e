//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file and
//! the `ARENA_`-prefixed environment surface. Conversions produce the
//! validated domain/application types the registry consumes.

use arena_application::DispatchConfig;
use arena_domain::{BackendSpec, Category, DomainError, PanelConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("request_timeout_seconds cannot be 0")]
    InvalidTimeout,

    #[error("max_models_concurrent cannot be 0")]
    InvalidConcurrency,

    #[error("invalid panel: {0}")]
    InvalidPanel(#[from] DomainError),
}

/// One `[[panel]]` entry in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileBackendSpec {
    /// Backend identifier as the service understands it
    pub id: String,
    /// Human-readable name
    pub name: String,
    pub category: Category,
}

impl From<&FileBackendSpec> for BackendSpec {
    fn from(spec: &FileBackendSpec) -> Self {
        BackendSpec::new(spec.id.as_str(), spec.name.as_str(), spec.category)
    }
}

/// Raw configuration from file and environment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// OpenRouter API credential; also read from `OPENROUTER_API_KEY`
    pub api_key: Option<String>,
    /// Upper bound on dispatchers running at once
    pub max_models_concurrent: usize,
    /// Per-attempt timeout for backend calls
    pub request_timeout_seconds: u64,
    /// Extra attempts after the first, for retryable failures
    pub max_retries: u32,
    /// First backoff delay between attempts
    pub backoff_base_ms: u64,
    /// Upper bound on a single backoff delay
    pub backoff_cap_ms: u64,
    /// Panel override; empty means the default nine-model panel
    pub panel: Vec<FileBackendSpec>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            max_models_concurrent: 9,
            request_timeout_seconds: 30,
            max_retries: 2,
            backoff_base_ms: 500,
            backoff_cap_ms: 8000,
            panel: Vec::new(),
        }
    }
}

impl FileConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.request_timeout_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }
        if self.max_models_concurrent == 0 {
            return Err(ConfigValidationError::InvalidConcurrency);
        }
        self.panel_config()?;
        Ok(())
    }

    /// Timeout/retry/backoff knobs for the dispatcher
    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            request_timeout: Duration::from_secs(self.request_timeout_seconds),
            max_retries: self.max_retries,
            backoff_base: Duration::from_millis(self.backoff_base_ms),
            backoff_cap: Duration::from_millis(self.backoff_cap_ms),
        }
    }

    /// The validated panel; the default panel when no override is configured
    pub fn panel_config(&self) -> Result<PanelConfig, DomainError> {
        if self.panel.is_empty() {
            return Ok(PanelConfig::default_panel());
        }
        PanelConfig::new(self.panel.iter().map(BackendSpec::from).collect())
    }
}
