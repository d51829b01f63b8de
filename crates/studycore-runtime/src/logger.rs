use chrono::{DateTime, Utc};
use studycore_types::{LogEntry, LogEntryKind, SessionId};

pub use studycore_types::{metadata_snapshot, DeviceSnapshot, EnvironmentEntry, InteractionSnapshot, MetadataSnapshot};

/// Seconds since `session_start`, the unit `LogEntry::timestamp_seconds`
/// orders on (spec.md §3; monotonic per session, invariant-adjacent to I5).
pub fn elapsed_seconds(session_start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - session_start).num_seconds()
}

pub fn entry(
    kind: LogEntryKind,
    metadata: serde_json::Value,
    session_start: DateTime<Utc>,
    now: DateTime<Utc>,
    session_id: SessionId,
) -> LogEntry {
    LogEntry::new(kind, metadata, elapsed_seconds(session_start, now), session_id)
}
