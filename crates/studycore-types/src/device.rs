use serde::{Deserialize, Serialize};

use crate::ids::{DeviceId, InteractionName};
use crate::value::Value;

/// Classification of an interaction, configured statically per device.
///
/// `StatelessAction` is the one variant with no persistent meaning: the
/// store never retains its value (spec.md §4.5, invariant I6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InteractionType {
    Boolean,
    Numerical,
    Generic,
    DynamicProperty,
    StatelessAction,
}

impl InteractionType {
    pub fn is_stateless(&self) -> bool {
        matches!(self, InteractionType::StatelessAction)
    }
}

/// A single named, typed value on a device — the atomic unit of device
/// state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub name: InteractionName,
    #[serde(rename = "type")]
    pub kind: InteractionType,
    pub value: Value,
}

/// Per-(session, configured-device) document. Mutations serialize per
/// (session, device) (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub device_id: DeviceId,
    pub interactions: Vec<Interaction>,
}

impl Device {
    pub fn new(device_id: DeviceId) -> Self {
        Self {
            device_id,
            interactions: Vec::new(),
        }
    }

    pub fn get(&self, name: &InteractionName) -> Option<&Value> {
        self.interactions
            .iter()
            .find(|i| &i.name == name)
            .map(|i| &i.value)
    }

    pub fn interaction(&self, name: &InteractionName) -> Option<&Interaction> {
        self.interactions.iter().find(|i| &i.name == name)
    }

    /// Overwrite the named interaction's value, or create it (with the
    /// given `kind`) if the device has none with that name yet. Used both
    /// for ordinary mutation and for stateless-action injection into a
    /// device the store has never seen that interaction on.
    pub fn set(&mut self, name: InteractionName, kind: InteractionType, value: Value) {
        if let Some(existing) = self.interactions.iter_mut().find(|i| i.name == name) {
            existing.value = value;
        } else {
            self.interactions.push(Interaction { name, kind, value });
        }
    }
}
