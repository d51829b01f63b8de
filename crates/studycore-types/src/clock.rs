use chrono::{DateTime, Utc};

/// Source of wall-clock time. Every timing-sensitive read in the runtime
/// goes through this instead of calling `Utc::now()` directly, so
/// `studycore-testing::TestClock` can make the wall-clock-offset scenarios
/// in spec.md §8 deterministic (see SPEC_FULL.md, §3).
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
