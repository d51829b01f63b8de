use studycore_types::{Device, DeviceId, InteractionName, InteractionType, Value};

/// Augments a device snapshot with a stateless action forced to `true`,
/// without persisting it (spec.md §4.5, invariant I6). The raw event
/// value is irrelevant: any event on a `StatelessAction` interaction is a
/// momentary trigger, evaluated as `true` regardless of what the client
/// sent. Returns a new snapshot; the caller evaluates rules/goals against
/// it and then discards it.
pub fn apply_stateless_action(devices: &[Device], device_id: &DeviceId, interaction: &InteractionName) -> Vec<Device> {
    let mut snapshot: Vec<Device> = devices.to_vec();
    match snapshot.iter_mut().find(|d| &d.device_id == device_id) {
        Some(device) => device.set(interaction.clone(), InteractionType::StatelessAction, Value::Bool(true)),
        None => {
            let mut device = Device::new(device_id.clone());
            device.set(interaction.clone(), InteractionType::StatelessAction, Value::Bool(true));
            snapshot.push(device);
        }
    }
    snapshot
}
