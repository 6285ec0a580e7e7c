use chrono::Utc;

/// Time source for the engine. Categorization and due-ness are pure over an
/// explicit timestamp, so the clock is only consulted at the session edge.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Frozen clock for tests and previews.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub timestamp_ms: i64,
}

impl FixedClock {
    pub fn new(timestamp_ms: i64) -> Self {
        Self { timestamp_ms }
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.timestamp_ms
    }
}
