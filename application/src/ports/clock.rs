//! Clock port
//!
//! Injected rather than read ambiently so request timestamps are controllable
//! in tests. Durations inside dispatch are measured with the runtime's own
//! monotonic clock.

use chrono::{DateTime, Utc};

/// Source of wall-clock timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
