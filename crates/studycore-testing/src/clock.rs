use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use studycore_types::Clock;

/// A settable [`Clock`] for the wall-clock-offset scenarios of spec.md §8
/// (timeouts, delayed rule actions, on-demand explanation caching)
/// without real sleeps.
pub struct TestClock {
    now: Mutex<DateTime<Utc>>,
}

impl TestClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(start) }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().expect("test clock mutex poisoned") = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("test clock mutex poisoned");
        *now += by;
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("test clock mutex poisoned")
    }
}
