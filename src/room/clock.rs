use chrono::{DateTime, Utc};

/// Source of wall-clock time for heartbeats, message timestamps and sweep
/// decisions. Injected so tests can advance time instead of sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
