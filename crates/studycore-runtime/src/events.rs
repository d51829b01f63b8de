use serde::Serialize;
use studycore_types::{DeviceId, InteractionName, Task, Value};
use uuid::Uuid;

/// One overwritten interaction produced by a task-transition's
/// `defaultDeviceProperties` cascade (spec.md §4.3).
#[derive(Debug, Clone, Serialize)]
pub struct UpdatedProperty {
    pub device_id: DeviceId,
    pub interaction: InteractionName,
    pub value: Value,
}

/// Outbound push to the browser client, one variant per row of spec.md
/// §4.7's outbound table. Serializes to the `{"type": "...", ...}` wire
/// envelope the duplex channel carries verbatim.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RuntimeEvent {
    UpdateInteraction {
        device_id: DeviceId,
        interaction: InteractionName,
        value: Value,
    },
    Explanation {
        explanation: String,
        explanation_id: Uuid,
        #[serde(skip_serializing_if = "Option::is_none")]
        rating: Option<i32>,
    },
    GameUpdate {
        #[serde(rename = "updatedTasks")]
        updated_tasks: Vec<Task>,
        #[serde(rename = "updatedProperties")]
        updated_properties: Vec<UpdatedProperty>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

/// Per-session fan-out channel. A session may have zero, one, or (briefly,
/// across a reconnect) more than one subscriber; `tokio::sync::broadcast`
/// matches that without the executor needing to track subscriber identity.
pub struct EventBus {
    sender: tokio::sync::broadcast::Sender<RuntimeEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = tokio::sync::broadcast::channel(256);
        Self { sender }
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<RuntimeEvent> {
        self.sender.subscribe()
    }

    /// No subscribers is not an error: pushes to a disconnected client are
    /// dropped, not queued (spec.md §5, "Cancellation and timeouts").
    pub fn publish(&self, event: RuntimeEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
