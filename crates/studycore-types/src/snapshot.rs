use std::collections::HashMap;

use serde::Serialize;

use crate::device::Device;
use crate::ids::{DeviceId, InteractionName, SessionId, TaskId};
use crate::value::Value;

/// Per-entry metadata snapshot handed to the explanation engine alongside
/// a log entry (spec.md §4.6). Built fresh on every append so a REST/
/// WebSocket engine always sees the state as of that entry, not a stale
/// cached view. Lives here rather than in `studycore-runtime` because
/// both the runtime (which builds it) and `studycore-providers` (whose
/// `ExplanationEngine::notify` consumes it) need the shape, and providers
/// sits below runtime in the dependency graph.
#[derive(Debug, Clone, Serialize)]
pub struct MetadataSnapshot {
    pub user_id: SessionId,
    pub current_task: Option<TaskId>,
    pub ingame_time: String,
    pub environment: Vec<EnvironmentEntry>,
    pub devices: Vec<DeviceSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentEntry {
    pub name: String,
    pub value: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceSnapshot {
    pub device: DeviceId,
    pub interactions: Vec<InteractionSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InteractionSnapshot {
    pub name: InteractionName,
    pub value: Value,
}

pub fn metadata_snapshot(
    session_id: &SessionId,
    current_task: Option<&TaskId>,
    ingame_time: &str,
    custom_data: &HashMap<String, Value>,
    devices: &[Device],
) -> MetadataSnapshot {
    MetadataSnapshot {
        user_id: session_id.clone(),
        current_task: current_task.cloned(),
        ingame_time: ingame_time.to_string(),
        environment: custom_data
            .iter()
            .map(|(name, value)| EnvironmentEntry { name: name.clone(), value: value.clone() })
            .collect(),
        devices: devices
            .iter()
            .map(|d| DeviceSnapshot {
                device: d.device_id.clone(),
                interactions: d
                    .interactions
                    .iter()
                    .map(|i| InteractionSnapshot { name: i.name.clone(), value: i.value.clone() })
                    .collect(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::InteractionType;

    #[test]
    fn snapshot_carries_every_device_interaction() {
        let mut device = Device::new("lamp1".into());
        device.set("power".into(), InteractionType::Boolean, Value::Bool(true));
        let snapshot = metadata_snapshot(&SessionId::from("s1"), None, "08:00", &HashMap::new(), &[device]);
        assert_eq!(snapshot.devices.len(), 1);
        assert_eq!(snapshot.devices[0].interactions[0].value, Value::Bool(true));
    }
}
