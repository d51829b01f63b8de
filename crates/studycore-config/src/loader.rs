use std::collections::HashMap;

use studycore_types::{DeviceId, Error, PreconditionAtom, Result, Rule, RuleAction, TaskId};

use crate::schema::{DeviceConfig, ExplanationConfigRaw, GameConfigRaw, TaskConfig, TasksConfig};

/// Validated, immutable view over the static `game` config. Shared
/// read-only by every session for the life of the process.
#[derive(Debug, Clone)]
pub struct GameConfig {
    devices: HashMap<DeviceId, DeviceConfig>,
    device_order: Vec<DeviceId>,
    tasks: Vec<TaskConfig>,
    task_index: HashMap<TaskId, usize>,
    pub tasks_meta: TasksConfig,
    pub rules: Vec<Rule>,
    pub environment: studycore_types::Value,
    raw: GameConfigRaw,
}

impl GameConfig {
    pub fn device_by_id(&self, id: &DeviceId) -> Option<&DeviceConfig> {
        self.devices.get(id)
    }

    pub fn devices_in_order(&self) -> impl Iterator<Item = &DeviceConfig> {
        self.device_order.iter().filter_map(|id| self.devices.get(id))
    }

    pub fn task_by_id(&self, id: &TaskId) -> Option<&TaskConfig> {
        self.task_index.get(id).and_then(|idx| self.tasks.get(*idx))
    }

    /// Declaration order, before any per-session shuffling.
    pub fn tasks_in_order(&self) -> &[TaskConfig] {
        &self.tasks
    }

    pub fn rules_in_order(&self) -> &[Rule] {
        &self.rules
    }

    pub fn time_config(&self) -> &crate::schema::TimeConfig {
        &self.raw.environment.time
    }

    pub fn task_timer(&self, task: &TaskConfig) -> f64 {
        match task.timer {
            Some(t) if t > 0.0 => t,
            _ => self.tasks_meta.timer,
        }
    }

    /// Tri-state `abortable` resolution: per-task override, else the
    /// global default.
    pub fn task_abortable(&self, task: &TaskConfig) -> bool {
        task.abortable.unwrap_or(self.tasks_meta.abortable)
    }
}

/// Validated, immutable view over the static `explanation` config.
#[derive(Debug, Clone)]
pub struct ExplanationConfig {
    pub raw: ExplanationConfigRaw,
}

impl ExplanationConfig {
    pub fn canned_text(&self, key: &str) -> Option<&str> {
        self.raw.texts.get(key).map(|s| s.as_str())
    }
}

fn collect_device_ids(raw: &GameConfigRaw) -> (HashMap<DeviceId, DeviceConfig>, Vec<DeviceId>) {
    let mut devices = HashMap::new();
    let mut order = Vec::new();
    for room in &raw.rooms {
        for wall in &room.walls {
            for device in &wall.devices {
                order.push(device.id.clone());
                devices.insert(device.id.clone(), device.clone());
            }
        }
    }
    (devices, order)
}

/// Parses and validates `game.json`. Rejects at load on structural
/// violations and on any dangling device reference from a task goal,
/// default-property, rule precondition, or rule action (spec.md §4.1).
/// Every violation found is collected into a single `Error::Validation`
/// rather than failing on the first.
pub fn load_game_config(source: &str) -> Result<GameConfig> {
    let raw: GameConfigRaw = serde_json::from_str(source)?;
    let (devices, device_order) = collect_device_ids(&raw);

    let mut errors = Vec::new();
    let mut task_index = HashMap::new();
    for (i, task) in raw.tasks.list.iter().enumerate() {
        if task_index.insert(task.id.clone(), i).is_some() {
            errors.push(format!("duplicate task id: {}", task.id));
        }
        for goal in &task.goals {
            check_device(&devices, &goal.device, &mut errors, &format!("task {} goal", task.id));
        }
        for prop in &task.default_device_properties {
            check_device(
                &devices,
                &prop.device,
                &mut errors,
                &format!("task {} defaultDeviceProperties", task.id),
            );
        }
    }

    for rule in &raw.rules {
        for atom in &rule.precondition {
            if let PreconditionAtom::Device { device, .. } = atom {
                check_device(&devices, device, &mut errors, &format!("rule {} precondition", rule.id));
            }
        }
        for action in &rule.action {
            if let RuleAction::DeviceInteraction { device, .. } = action {
                check_device(&devices, device, &mut errors, &format!("rule {} action", rule.id));
            }
        }
        if let Some(delay) = rule.delay {
            if delay < 0.0 {
                errors.push(format!("rule {} has a negative delay", rule.id));
            }
        }
    }

    if raw.tasks.list.is_empty() {
        errors.push("game.tasks.list must not be empty".to_string());
    }

    if !errors.is_empty() {
        return Err(Error::validation(errors.join("; ")));
    }

    let tasks = raw.tasks.list.clone();
    let tasks_meta = TasksConfig {
        ordered: raw.tasks.ordered,
        timer: raw.tasks.timer,
        abortable: raw.tasks.abortable,
        list: Vec::new(),
    };
    let rules = raw.rules.clone();
    let environment = environment_to_value(&raw);

    Ok(GameConfig {
        devices,
        device_order,
        tasks,
        task_index,
        tasks_meta,
        rules,
        environment,
        raw,
    })
}

fn environment_to_value(raw: &GameConfigRaw) -> studycore_types::Value {
    studycore_types::Value::Json(serde_json::to_value(&raw.environment).unwrap_or_default())
}

fn check_device(
    devices: &HashMap<DeviceId, DeviceConfig>,
    device: &DeviceId,
    errors: &mut Vec<String>,
    context: &str,
) {
    if !devices.contains_key(device) {
        errors.push(format!("{context} references unknown device '{device}'"));
    }
}

/// Parses and validates `explanation.json`. The only structural
/// requirement beyond the schema itself: `mode == integrated` requires a
/// non-empty canned-text table (it has nothing to produce explanations
/// from otherwise), and `mode == external` requires an engine transport.
pub fn load_explanation_config(source: &str) -> Result<ExplanationConfig> {
    let raw: ExplanationConfigRaw = serde_json::from_str(source)?;

    use crate::schema::EngineMode;
    match raw.mode {
        EngineMode::Integrated if raw.texts.is_empty() => {
            return Err(Error::validation(
                "explanation.mode == integrated requires a non-empty texts table",
            ));
        }
        EngineMode::External if raw.engine.is_none() => {
            return Err(Error::validation(
                "explanation.mode == external requires an engine transport",
            ));
        }
        _ => {}
    }

    Ok(ExplanationConfig { raw })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_game_config() -> serde_json::Value {
        serde_json::json!({
            "rooms": [{"walls": [{"devices": [
                {"id": "light", "interactions": [{"name": "power", "type": "boolean", "value": false}]}
            ]}]}],
            "tasks": {"list": [{"id": "T1", "description": "a task"}]},
            "environment": {"time": {"startTime": {"hour": 8, "minute": 0}, "speed": 1}}
        })
    }

    #[test]
    fn loads_a_minimal_config() {
        let config = load_game_config(&minimal_game_config().to_string()).unwrap();
        assert_eq!(config.tasks_in_order().len(), 1);
        assert_eq!(config.devices_in_order().count(), 1);
        assert!(config.tasks_meta.ordered);
        assert!(config.tasks_meta.abortable);
    }

    #[test]
    fn rejects_duplicate_task_ids() {
        let mut raw = minimal_game_config();
        raw["tasks"]["list"] = serde_json::json!([
            {"id": "T1", "description": "a"},
            {"id": "T1", "description": "b"},
        ]);
        let err = load_game_config(&raw.to_string()).unwrap_err();
        assert!(matches!(err, Error::Validation(msg) if msg.contains("duplicate task id")));
    }

    #[test]
    fn rejects_an_empty_task_list() {
        let mut raw = minimal_game_config();
        raw["tasks"]["list"] = serde_json::json!([]);
        let err = load_game_config(&raw.to_string()).unwrap_err();
        assert!(matches!(err, Error::Validation(msg) if msg.contains("must not be empty")));
    }

    #[test]
    fn rejects_a_goal_referencing_an_unknown_device() {
        let mut raw = minimal_game_config();
        raw["tasks"]["list"][0]["goals"] = serde_json::json!([
            {"device": "thermostat", "interaction": "power", "operator": "==", "value": true}
        ]);
        let err = load_game_config(&raw.to_string()).unwrap_err();
        assert!(matches!(err, Error::Validation(msg) if msg.contains("unknown device 'thermostat'")));
    }

    #[test]
    fn rejects_default_device_properties_referencing_an_unknown_device() {
        let mut raw = minimal_game_config();
        raw["tasks"]["list"][0]["defaultDeviceProperties"] = serde_json::json!([
            {"device": "thermostat", "interaction": "power", "value": true}
        ]);
        let err = load_game_config(&raw.to_string()).unwrap_err();
        assert!(matches!(err, Error::Validation(msg) if msg.contains("defaultDeviceProperties references unknown device")));
    }

    #[test]
    fn rejects_a_rule_precondition_referencing_an_unknown_device() {
        let mut raw = minimal_game_config();
        raw["rules"] = serde_json::json!([{
            "id": "R1",
            "precondition": [{"kind": "device", "device": "thermostat", "interaction": "power", "operator": "==", "value": true}],
            "action": []
        }]);
        let err = load_game_config(&raw.to_string()).unwrap_err();
        assert!(matches!(err, Error::Validation(msg) if msg.contains("precondition references unknown device")));
    }

    #[test]
    fn rejects_a_rule_action_referencing_an_unknown_device() {
        let mut raw = minimal_game_config();
        raw["rules"] = serde_json::json!([{
            "id": "R1",
            "precondition": [],
            "action": [{"kind": "device_interaction", "device": "thermostat", "interaction": "power", "value": true}]
        }]);
        let err = load_game_config(&raw.to_string()).unwrap_err();
        assert!(matches!(err, Error::Validation(msg) if msg.contains("action references unknown device")));
    }

    #[test]
    fn rejects_a_negative_rule_delay() {
        let mut raw = minimal_game_config();
        raw["rules"] = serde_json::json!([{
            "id": "R1",
            "precondition": [],
            "action": [],
            "delay": -1.0
        }]);
        let err = load_game_config(&raw.to_string()).unwrap_err();
        assert!(matches!(err, Error::Validation(msg) if msg.contains("negative delay")));
    }

    #[test]
    fn collects_every_violation_instead_of_failing_on_the_first() {
        let mut raw = minimal_game_config();
        raw["tasks"]["list"] = serde_json::json!([
            {"id": "T1", "goals": [{"device": "missing-a", "interaction": "power", "operator": "==", "value": true}]},
            {"id": "T1", "goals": [{"device": "missing-b", "interaction": "power", "operator": "==", "value": true}]},
        ]);
        let err = load_game_config(&raw.to_string()).unwrap_err();
        let Error::Validation(msg) = err else { panic!("expected a validation error") };
        assert!(msg.contains("duplicate task id"));
        assert!(msg.contains("missing-a"));
        assert!(msg.contains("missing-b"));
    }

    fn minimal_explanation_config() -> serde_json::Value {
        serde_json::json!({"trigger": "automatic", "mode": "none", "allowUserMessage": true})
    }

    #[test]
    fn loads_a_none_mode_explanation_config_with_no_texts() {
        let config = load_explanation_config(&minimal_explanation_config().to_string()).unwrap();
        assert_eq!(config.canned_text("anything"), None);
    }

    #[test]
    fn integrated_mode_requires_a_non_empty_texts_table() {
        let mut raw = minimal_explanation_config();
        raw["mode"] = serde_json::json!("integrated");
        let err = load_explanation_config(&raw.to_string()).unwrap_err();
        assert!(matches!(err, Error::Validation(msg) if msg.contains("non-empty texts table")));

        raw["texts"] = serde_json::json!({"rule_fired": "A rule just fired."});
        let config = load_explanation_config(&raw.to_string()).unwrap();
        assert_eq!(config.canned_text("rule_fired"), Some("A rule just fired."));
    }

    #[test]
    fn external_mode_requires_an_engine_transport() {
        let mut raw = minimal_explanation_config();
        raw["mode"] = serde_json::json!("external");
        let err = load_explanation_config(&raw.to_string()).unwrap_err();
        assert!(matches!(err, Error::Validation(msg) if msg.contains("engine transport")));

        raw["engine"] = serde_json::json!({"transport": "rest", "url": "https://example.test/explain"});
        assert!(load_explanation_config(&raw.to_string()).is_ok());
    }
}
