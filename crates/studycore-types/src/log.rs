use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as Json;

use crate::ids::SessionId;

/// Log entry types from spec.md §3, plus a passthrough variant for
/// arbitrary `game-interaction` event types. Hand-rolled (de)serialization
/// because the wire form is a flat string for every variant, including
/// the passthrough one, which a derived tagged/untagged enum can't express.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntryKind {
    TaskBegin,
    TaskCompleted,
    TaskTimeout,
    AbortTask,
    DeviceInteraction,
    RuleTrigger,
    Custom(String),
}

impl LogEntryKind {
    pub fn as_str(&self) -> &str {
        match self {
            LogEntryKind::TaskBegin => "TASK_BEGIN",
            LogEntryKind::TaskCompleted => "TASK_COMPLETED",
            LogEntryKind::TaskTimeout => "TASK_TIMEOUT",
            LogEntryKind::AbortTask => "ABORT_TASK",
            LogEntryKind::DeviceInteraction => "DEVICE_INTERACTION",
            LogEntryKind::RuleTrigger => "RULE_TRIGGER",
            LogEntryKind::Custom(s) => s.as_str(),
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "TASK_BEGIN" => LogEntryKind::TaskBegin,
            "TASK_COMPLETED" => LogEntryKind::TaskCompleted,
            "TASK_TIMEOUT" => LogEntryKind::TaskTimeout,
            "ABORT_TASK" => LogEntryKind::AbortTask,
            "DEVICE_INTERACTION" => LogEntryKind::DeviceInteraction,
            "RULE_TRIGGER" => LogEntryKind::RuleTrigger,
            other => LogEntryKind::Custom(other.to_string()),
        }
    }
}

impl Serialize for LogEntryKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LogEntryKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(LogEntryKind::from_str(&s))
    }
}

/// Append-only per-session log entry, used to drive the explanation
/// engine and post-hoc analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(rename = "type")]
    pub kind: LogEntryKind,
    pub metadata: Json,
    pub timestamp_seconds: i64,
    pub user_session_id: SessionId,
}

impl LogEntry {
    /// `timestamp_seconds` is seconds elapsed since the owning session's
    /// `start_time`, not a wall-clock epoch stamp — it orders a session's
    /// own log independent of when that session happened to run.
    pub fn new(
        kind: LogEntryKind,
        metadata: Json,
        timestamp_seconds: i64,
        user_session_id: SessionId,
    ) -> Self {
        Self {
            kind,
            metadata,
            timestamp_seconds,
            user_session_id,
        }
    }
}
