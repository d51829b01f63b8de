use serde::{Deserialize, Serialize};

use crate::ids::{DeviceId, InteractionName, RuleId};
use crate::value::{Operator, Value};

/// A single precondition atom. Modeled as a tagged variant per kind
/// rather than a bag with a `type` string and untyped payload, so an
/// unknown kind is a config-load error instead of a runtime surprise
/// (spec.md §9, "Rule atom polymorphism").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PreconditionAtom {
    /// Compares a device interaction's current value.
    Device {
        device: DeviceId,
        interaction: InteractionName,
        operator: Operator,
        value: Value,
    },
    /// Compares the in-game clock, given as `HH:MM`.
    Time { operator: Operator, value: String },
    /// Compares a `custom_data`/context attribute (including `task`).
    Context {
        name: String,
        operator: Operator,
        value: Value,
    },
}

/// A single action emitted when a rule fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleAction {
    DeviceInteraction {
        device: DeviceId,
        interaction: InteractionName,
        value: Value,
    },
    /// Only acted on when `explanation.mode == integrated`; `key` selects
    /// the canned text from the explanation config.
    Explanation { key: String },
}

/// Static, config-owned conditional mapping sensor/context/time predicates
/// to device and explanation actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    /// Conjunction of atoms, evaluated in declaration order with
    /// short-circuit on the first false atom.
    pub precondition: Vec<PreconditionAtom>,
    /// Actions fired in order when every precondition atom is true.
    pub action: Vec<RuleAction>,
    /// Seconds, >= 0. Applies to every action this rule emits.
    pub delay: Option<f64>,
}

impl Rule {
    pub fn delay_seconds(&self) -> f64 {
        self.delay.unwrap_or(0.0).max(0.0)
    }
}

/// A goal atom shares operator semantics with a rule's device atom, but
/// goals only ever compare device state (spec.md §4.5, Goal checker).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalAtom {
    pub device: DeviceId,
    pub interaction: InteractionName,
    pub operator: Operator,
    pub value: Value,
}
