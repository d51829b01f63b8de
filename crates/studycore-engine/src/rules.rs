use std::collections::HashMap;

use chrono::{DateTime, Utc};
use studycore_types::{Device, Rule, Value};

use crate::precondition::evaluate_all;

/// Rules whose precondition currently holds, in declaration order. Firing
/// order is the order rules appear in `game.rules`; callers apply actions
/// in that order and, per rule, after that rule's configured delay.
pub fn eligible_rules<'a>(
    rules: &'a [Rule],
    devices: &[Device],
    game_time: DateTime<Utc>,
    context: &HashMap<String, Value>,
) -> Vec<&'a Rule> {
    rules
        .iter()
        .filter(|rule| evaluate_all(&rule.precondition, devices, game_time, context))
        .collect()
}
