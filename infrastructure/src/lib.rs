//! Infrastructure layer for model-arena
//!
//! Adapters behind the application layer's ports: the OpenRouter backend
//! client, the figment-based configuration loader, and the system clock.

pub mod clock;
pub mod config;
pub mod providers;

// Re-export commonly used types
pub use clock::SystemClock;
pub use config::{ConfigLoader, ConfigValidationError, FileBackendSpec, FileConfig};
pub use providers::openrouter::{OpenRouterClient, OpenRouterError};
