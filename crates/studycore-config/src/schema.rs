use serde::{Deserialize, Serialize};

use studycore_types::{DeviceId, GoalAtom, InteractionName, InteractionType, Rule, TaskId, Value};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InteractionConfig {
    pub name: InteractionName,
    #[serde(rename = "type")]
    pub kind: InteractionType,
    pub value: Value,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    pub id: DeviceId,
    pub interactions: Vec<InteractionConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WallConfig {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoomConfig {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub walls: Vec<WallConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DevicePropertyOverride {
    pub device: DeviceId,
    pub interaction: InteractionName,
    pub value: Value,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnvironmentVariable {
    pub name: String,
    pub value: Value,
}

/// Tri-state override for `abortable`: `None` inherits from
/// `game.tasks.abortable` (default `true` if that too is absent), matching
/// the open question resolved in SPEC_FULL.md.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaskConfig {
    pub id: TaskId,
    #[serde(default)]
    pub description: String,
    /// Seconds; `0` or absent falls back to `tasks.timer` (B3).
    #[serde(default)]
    pub timer: Option<f64>,
    #[serde(default)]
    pub goals: Vec<GoalAtom>,
    #[serde(default, rename = "defaultDeviceProperties")]
    pub default_device_properties: Vec<DevicePropertyOverride>,
    #[serde(default, rename = "abortionOptions")]
    pub abortion_options: Vec<String>,
    #[serde(default)]
    pub abortable: Option<bool>,
    #[serde(default)]
    pub environment: Vec<EnvironmentVariable>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TasksConfig {
    #[serde(default = "default_true")]
    pub ordered: bool,
    #[serde(default)]
    pub timer: f64,
    #[serde(default = "default_true")]
    pub abortable: bool,
    #[serde(rename = "list")]
    pub list: Vec<TaskConfig>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimeOfDayConfig {
    pub hour: u32,
    pub minute: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimeConfig {
    #[serde(rename = "startTime")]
    pub start_time: TimeOfDayConfig,
    pub speed: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnvironmentConfig {
    pub time: TimeConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GameConfigRaw {
    #[serde(default)]
    pub rooms: Vec<RoomConfig>,
    pub tasks: TasksConfig,
    #[serde(default)]
    pub rules: Vec<Rule>,
    pub environment: EnvironmentConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerPolicy {
    Automatic,
    OnDemand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineMode {
    Integrated,
    External,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    Rest,
    Websocket,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExternalEngineConfig {
    pub transport: Transport,
    pub url: String,
    #[serde(default)]
    pub timeout_seconds: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExplanationConfigRaw {
    pub trigger: TriggerPolicy,
    pub mode: EngineMode,
    #[serde(default)]
    pub rating_mode: Option<String>,
    #[serde(default, rename = "allowUserMessage")]
    pub allow_user_message: bool,
    /// Explanation key -> canned text, for `mode == integrated`.
    #[serde(default)]
    pub texts: std::collections::HashMap<String, String>,
    #[serde(default)]
    pub engine: Option<ExternalEngineConfig>,
}
