//! System clock adapter

use arena_application::Clock;
use chrono::{DateTime, Utc};

/// Wall-clock time from the OS
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
