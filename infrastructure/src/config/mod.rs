//! Configuration loading and validation

mod file_config;
mod loader;

pub use file_config::{ConfigValidationError, FileBackendSpec, FileConfig};
pub use loader::ConfigLoader;
