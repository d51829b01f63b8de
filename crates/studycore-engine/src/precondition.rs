use std::collections::HashMap;

use studycore_types::{Device, PreconditionAtom, Value};

use crate::gametime::game_clock_string;

/// Evaluates one precondition atom against a device snapshot, the current
/// in-game clock, and the session's context variables. `devices` may be a
/// stateless-action-augmented snapshot rather than the persisted state.
pub fn evaluate_atom(
    atom: &PreconditionAtom,
    devices: &[Device],
    game_clock: &str,
    context: &HashMap<String, Value>,
) -> bool {
    match atom {
        PreconditionAtom::Device { device, interaction, operator, value } => devices
            .iter()
            .find(|d| &d.device_id == device)
            .and_then(|d| d.get(interaction))
            .map(|actual| actual.compare(*operator, value))
            .unwrap_or(false),
        PreconditionAtom::Time { operator, value } => {
            let actual = Value::Text(game_clock.to_string());
            actual.compare(*operator, &Value::Text(value.clone()))
        }
        PreconditionAtom::Context { name, operator, value } => context
            .get(name)
            .map(|actual| actual.compare(*operator, value))
            .unwrap_or(false),
    }
}

/// A rule's precondition is a conjunction: every atom must hold for the
/// rule to be eligible to fire.
pub fn evaluate_all(
    atoms: &[PreconditionAtom],
    devices: &[Device],
    game_time: chrono::DateTime<chrono::Utc>,
    context: &HashMap<String, Value>,
) -> bool {
    let clock = game_clock_string(game_time);
    atoms.iter().all(|atom| evaluate_atom(atom, devices, &clock, context))
}
