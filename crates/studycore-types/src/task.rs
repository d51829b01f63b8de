use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::TaskId;

/// One per (session, configured-task). Terminal transitions
/// (`is_completed`/`is_aborted`/`is_timed_out`) are mutually exclusive and
/// final (invariant I2, spec.md §3/§8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_id: TaskId,
    pub task_order: usize,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_completed: bool,
    pub is_aborted: bool,
    pub is_timed_out: bool,
    pub completion_time: Option<DateTime<Utc>>,
    pub aborted_reason: Option<String>,
    /// Seconds; set exactly when the task becomes terminal.
    pub duration: Option<f64>,
    pub interaction_times: u64,
}

impl Task {
    pub fn is_terminal(&self) -> bool {
        self.is_completed || self.is_aborted || self.is_timed_out
    }

    /// Whether `now` falls within this task's timed window and it hasn't
    /// already terminated — the "current task" predicate from spec.md §3.
    pub fn is_current_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_terminal() && self.start_time <= now && now <= self.end_time
    }

    pub fn configured_duration(&self) -> chrono::Duration {
        self.end_time - self.start_time
    }
}
