use studycore_config::GameConfig;
use studycore_types::{Device, DeviceId, InteractionName, InteractionType, Value};

/// Materializes one Device per configured device, copying each
/// interaction's initial value (spec.md §4.2, Session Manager "Devices").
pub fn initial_devices(config: &GameConfig) -> Vec<Device> {
    config
        .devices_in_order()
        .map(|device_cfg| {
            let mut device = Device::new(device_cfg.id.clone());
            for interaction in &device_cfg.interactions {
                device.set(interaction.name.clone(), interaction.kind, interaction.value.clone());
            }
            device
        })
        .collect()
}

/// The configured type of a device's interaction, consulted to decide
/// whether an inbound `device-interaction` event is a stateless action
/// (spec.md §4.5).
pub fn interaction_kind(config: &GameConfig, device_id: &DeviceId, interaction: &InteractionName) -> Option<InteractionType> {
    config
        .device_by_id(device_id)
        .and_then(|d| d.interactions.iter().find(|i| &i.name == interaction))
        .map(|i| i.kind)
}

pub fn get<'a>(devices: &'a [Device], device_id: &DeviceId, interaction: &InteractionName) -> Option<&'a Value> {
    devices.iter().find(|d| &d.device_id == device_id).and_then(|d| d.get(interaction))
}

/// Overwrites (or creates) one interaction's value in place. Used both for
/// ordinary persisted mutation and for `defaultDeviceProperties` cascades;
/// never used for stateless actions, which go through
/// `studycore_engine::apply_stateless_action` instead and are never
/// written back here.
pub fn apply(devices: &mut Vec<Device>, device_id: &DeviceId, interaction: &InteractionName, kind: InteractionType, value: Value) {
    match devices.iter_mut().find(|d| &d.device_id == device_id) {
        Some(device) => device.set(interaction.clone(), kind, value),
        None => {
            let mut device = Device::new(device_id.clone());
            device.set(interaction.clone(), kind, value);
            devices.push(device);
        }
    }
}
