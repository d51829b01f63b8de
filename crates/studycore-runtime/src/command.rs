use studycore_types::{Device, DeviceId, InteractionName, RuleAction, Task, TaskId, Value};
use uuid::Uuid;

/// Snapshot returned to a `GameData` query, already reconciled for
/// timeouts (spec.md §4.3, "Lazy timeout reconciliation").
#[derive(Debug, Clone)]
pub struct GameDataSnapshot {
    pub tasks: Vec<Task>,
    pub devices: Vec<Device>,
}

/// Everything that flows through a session's single command queue: the
/// inbound client events of spec.md §4.7, session-manager lifecycle
/// queries that need the reconciled task timeline, and delayed rule
/// actions re-entering the executor on fire (spec.md §9, "Delayed rule
/// actions").
#[derive(Debug)]
pub enum Command {
    GameStart,
    DeviceInteraction {
        device: DeviceId,
        interaction: InteractionName,
        value: Value,
    },
    GameInteraction {
        kind: String,
        data: Value,
    },
    TaskTimeout {
        task_id: TaskId,
    },
    TaskAbort {
        task_id: TaskId,
        option: String,
    },
    ExplanationRequest {
        user_message: Option<String>,
    },
    ExplanationRating {
        explanation_id: Uuid,
        rating: i32,
    },
    /// An `explanation_receival` frame forwarded by the WebSocket
    /// explanation engine's background task, routed here through the
    /// session registry rather than a synchronous `generate()` reply
    /// (spec.md §6).
    ExternalExplanation {
        explanation: String,
    },
    /// One rule action, re-entered after its rule's configured delay.
    DelayedRuleAction {
        rule_id: studycore_types::RuleId,
        action: RuleAction,
    },
    GameData {
        respond_to: tokio::sync::oneshot::Sender<GameDataSnapshot>,
    },
    Shutdown,
}
