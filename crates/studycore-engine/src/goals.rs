use studycore_types::{Device, GoalAtom};

/// A task is complete when every one of its configured goal atoms holds
/// against the current device snapshot (spec.md §4.4). Conjunction, same
/// as a rule precondition; an empty goal list is vacuously satisfied.
pub fn goals_met(goals: &[GoalAtom], devices: &[Device]) -> bool {
    goals.iter().all(|goal| {
        devices
            .iter()
            .find(|d| d.device_id == goal.device)
            .and_then(|d| d.get(&goal.interaction))
            .map(|actual| actual.compare(goal.operator, &goal.value))
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use studycore_types::{InteractionType, Operator, Value};

    #[test]
    fn empty_goal_list_is_satisfied() {
        assert!(goals_met(&[], &[]));
    }

    #[test]
    fn unmet_goal_blocks_completion() {
        let device = studycore_types::Device::new("lamp1".into());
        let goal = GoalAtom {
            device: "lamp1".into(),
            interaction: "power".into(),
            operator: Operator::Eq,
            value: Value::Bool(true),
        };
        assert!(!goals_met(&[goal], &[device]));
    }

    #[test]
    fn met_goal_allows_completion() {
        let mut device = studycore_types::Device::new("lamp1".into());
        device.set("power".into(), InteractionType::Boolean, Value::Bool(true));
        let goal = GoalAtom {
            device: "lamp1".into(),
            interaction: "power".into(),
            operator: Operator::Eq,
            value: Value::Bool(true),
        };
        assert!(goals_met(&[goal], &[device]));
    }
}
