//! Wall-clock source for deploy timestamps and version ids.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that starts at a fixed epoch second and advances by `step` on every read.
#[derive(Debug)]
pub struct SteppingClock {
    next: AtomicI64,
    step: i64,
}

impl SteppingClock {
    pub fn new(start_epoch_secs: i64, step: i64) -> Self {
        Self {
            next: AtomicI64::new(start_epoch_secs),
            step,
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let secs = self.next.fetch_add(self.step, Ordering::SeqCst);
        DateTime::from_timestamp(secs, 0).unwrap_or_default()
    }
}

/// ISO-8601 UTC with second precision, e.g. `2024-05-01T10:00:00Z`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Render an epoch-seconds version id as a timestamp, if it is numeric.
pub fn format_epoch_id(id: &str) -> Option<String> {
    let secs: i64 = id.parse().ok()?;
    DateTime::from_timestamp(secs, 0).map(format_timestamp)
}
