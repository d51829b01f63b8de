//! Builders for the two static config documents (spec.md §4.1), with
//! override points for the handful of fields each scenario in spec.md §8
//! actually varies. `build()` always produces a config that loads
//! successfully through `studycore_config::load_game_config`.

use serde_json::{json, Value};

pub struct GameConfigFixture {
    ordered: bool,
    timer: f64,
    abortable: bool,
    devices: Vec<Value>,
    tasks: Vec<Value>,
    rules: Vec<Value>,
    environment: Value,
}

impl Default for GameConfigFixture {
    /// One device (`light.power`), one task (`T1`, 60s, goal
    /// `light.power == true`), no rules — the happy-path scenario's
    /// starting point.
    fn default() -> Self {
        Self {
            ordered: true,
            timer: 60.0,
            abortable: true,
            devices: vec![json!({
                "id": "light",
                "interactions": [{"name": "power", "type": "boolean", "value": false}]
            })],
            tasks: vec![json!({
                "id": "T1",
                "description": "Turn on the light",
                "goals": [{"device": "light", "interaction": "power", "operator": "==", "value": true}],
                "defaultDeviceProperties": [{"device": "light", "interaction": "power", "value": false}],
                "abortionOptions": ["too hard", "uninterested"]
            })],
            rules: Vec::new(),
            environment: json!({"time": {"startTime": {"hour": 8, "minute": 0}, "speed": 60}}),
        }
    }
}

impl GameConfigFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_devices(mut self, devices: Vec<Value>) -> Self {
        self.devices = devices;
        self
    }

    pub fn with_tasks(mut self, tasks: Vec<Value>) -> Self {
        self.tasks = tasks;
        self
    }

    pub fn with_rules(mut self, rules: Vec<Value>) -> Self {
        self.rules = rules;
        self
    }

    pub fn ordered(mut self, ordered: bool) -> Self {
        self.ordered = ordered;
        self
    }

    pub fn timer(mut self, timer: f64) -> Self {
        self.timer = timer;
        self
    }

    pub fn abortable(mut self, abortable: bool) -> Self {
        self.abortable = abortable;
        self
    }

    pub fn environment(mut self, environment: Value) -> Self {
        self.environment = environment;
        self
    }

    pub fn build(self) -> String {
        json!({
            "rooms": [{
                "id": "room1",
                "walls": [{"id": "wall1", "devices": self.devices}]
            }],
            "tasks": {
                "ordered": self.ordered,
                "timer": self.timer,
                "abortable": self.abortable,
                "list": self.tasks
            },
            "rules": self.rules,
            "environment": self.environment,
        })
        .to_string()
    }
}

/// `explanation.mode == "none"`: no engine, no explanation side effects.
/// The default for scenarios that aren't exercising the explanation path.
pub fn explanation_config_none() -> String {
    json!({"trigger": "automatic", "mode": "none", "allowUserMessage": true, "texts": {}}).to_string()
}

/// `explanation.mode == "integrated"` with one canned text keyed
/// `"rule_fired"`, `trigger == "automatic"`.
pub fn explanation_config_integrated_automatic() -> String {
    json!({
        "trigger": "automatic",
        "mode": "integrated",
        "allowUserMessage": true,
        "texts": {"rule_fired": "A rule just fired."}
    })
    .to_string()
}

/// `explanation.mode == "integrated"`, `trigger == "on_demand"`: nothing
/// is pushed eagerly, `explanation_request` drains `session.explanation_cache`.
pub fn explanation_config_integrated_on_demand() -> String {
    json!({
        "trigger": "on_demand",
        "mode": "integrated",
        "allowUserMessage": true,
        "texts": {"rule_fired": "A rule just fired."}
    })
    .to_string()
}
