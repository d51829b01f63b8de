//! Internal data model and error taxonomy for the study orchestration
//! core (spec.md §3, §7). Shared read-only by every crate above it in
//! the dependency graph.

pub mod clock;
pub mod device;
pub mod error;
pub mod explanation;
pub mod ids;
pub mod log;
pub mod rule;
pub mod session;
pub mod snapshot;
pub mod task;
pub mod value;

pub use clock::{Clock, SystemClock};
pub use device::{Device, Interaction, InteractionType};
pub use error::{Error, Result};
pub use explanation::Explanation;
pub use ids::{DeviceId, InteractionName, RuleId, SessionId, TaskId};
pub use log::{LogEntry, LogEntryKind};
pub use rule::{GoalAtom, PreconditionAtom, Rule, RuleAction};
pub use session::Session;
pub use snapshot::{metadata_snapshot, DeviceSnapshot, EnvironmentEntry, InteractionSnapshot, MetadataSnapshot};
pub use task::Task;
pub use value::{Operator, Value};
