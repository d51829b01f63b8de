use serde::Serialize;
use studycore_config::schema::EnvironmentVariable;
use studycore_types::Task;

/// The session's full task list, enriched with config-derived fields the
/// client needs but the persisted `Task` document doesn't carry
/// (spec.md §4.7, outbound `game-update`/`game-data`).
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedTask {
    #[serde(flatten)]
    pub task: Task,
    #[serde(rename = "abortionOptions")]
    pub abortion_options: Vec<String>,
    pub abortable: bool,
    pub environment: Vec<EnvironmentVariable>,
}

/// Response body for `GET /game-data` (spec.md §6).
#[derive(Debug, Clone, Serialize)]
pub struct GameDataResponse {
    #[serde(rename = "gameConfig")]
    pub game_config: serde_json::Value,
    pub tasks: Vec<EnrichedTask>,
}
