use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use studycore_config::{ExplanationConfig, GameConfig};
use studycore_providers::{ExplanationEngine, ExplanationSink};
use studycore_runtime::{Command, RuntimeEvent, SessionManager, SessionRegistry};
use studycore_store::Store;
use studycore_types::{Clock, DeviceId, Error, InteractionName, Result, SessionId, SystemClock, TaskId, Value};

use crate::types::{EnrichedTask, GameDataResponse};

/// Public facade over config, store, providers, and runtime. One
/// `StudyCore` is built per process and shared by every connected client.
pub struct StudyCore {
    config: Arc<GameConfig>,
    explanation_config: Arc<ExplanationConfig>,
    store: Arc<Store>,
    sessions: SessionManager,
}

impl StudyCore {
    pub fn open(game_config_json: &str, explanation_config_json: &str, db_path: &Path) -> Result<Self> {
        Self::open_with_clock(game_config_json, explanation_config_json, db_path, Arc::new(SystemClock))
    }

    /// Same as [`open`](Self::open), but with an injectable [`Clock`] so
    /// the wall-clock-offset scenarios in spec.md §8 can run against a
    /// `studycore_testing::TestClock` instead of real time.
    pub fn open_with_clock(
        game_config_json: &str,
        explanation_config_json: &str,
        db_path: &Path,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let config = Arc::new(studycore_config::load_game_config(game_config_json)?);
        let explanation_config_raw = studycore_config::load_explanation_config(explanation_config_json)?;
        let registry = Arc::new(SessionRegistry::new());
        let sink: Arc<dyn ExplanationSink> = registry.clone();
        let engine: Arc<dyn ExplanationEngine> = Arc::from(studycore_providers::build_engine(explanation_config_raw.clone(), sink)?);
        let explanation_config = Arc::new(explanation_config_raw);
        let store = Arc::new(Store::open(db_path)?);

        let sessions = SessionManager::new(store.clone(), config.clone(), explanation_config.clone(), engine, clock, registry);
        Ok(Self { config, explanation_config, store, sessions })
    }

    pub fn open_in_memory(game_config_json: &str, explanation_config_json: &str, clock: Arc<dyn Clock>) -> Result<Self> {
        let config = Arc::new(studycore_config::load_game_config(game_config_json)?);
        let explanation_config_raw = studycore_config::load_explanation_config(explanation_config_json)?;
        let registry = Arc::new(SessionRegistry::new());
        let sink: Arc<dyn ExplanationSink> = registry.clone();
        let engine: Arc<dyn ExplanationEngine> = Arc::from(studycore_providers::build_engine(explanation_config_raw.clone(), sink)?);
        let explanation_config = Arc::new(explanation_config_raw);
        let store = Arc::new(Store::open_in_memory()?);

        let sessions = SessionManager::new(store.clone(), config.clone(), explanation_config.clone(), engine, clock, registry);
        Ok(Self { config, explanation_config, store, sessions })
    }

    pub async fn create_session(&self, session_id: SessionId, custom_data: HashMap<String, Value>) -> Result<()> {
        self.sessions.create(session_id, custom_data).await
    }

    /// `(valid, completed)` — spec.md §4.2, round-trip law L1.
    pub async fn verify_session(&self, session_id: &SessionId) -> Result<(bool, bool)> {
        self.sessions.verify(session_id).await
    }

    pub async fn complete_session(&self, session_id: &SessionId) -> Result<()> {
        self.sessions.complete(session_id).await
    }

    pub async fn game_start(&self, session_id: &SessionId) -> Result<()> {
        self.sessions.dispatch(session_id, Command::GameStart).await
    }

    pub async fn device_interaction(&self, session_id: &SessionId, device: DeviceId, interaction: InteractionName, value: Value) -> Result<()> {
        self.sessions.dispatch(session_id, Command::DeviceInteraction { device, interaction, value }).await
    }

    pub async fn game_interaction(&self, session_id: &SessionId, kind: String, data: Value) -> Result<()> {
        self.sessions.dispatch(session_id, Command::GameInteraction { kind, data }).await
    }

    pub async fn task_timeout(&self, session_id: &SessionId, task_id: TaskId) -> Result<()> {
        self.sessions.dispatch(session_id, Command::TaskTimeout { task_id }).await
    }

    pub async fn task_abort(&self, session_id: &SessionId, task_id: TaskId, option: String) -> Result<()> {
        self.sessions.dispatch(session_id, Command::TaskAbort { task_id, option }).await
    }

    pub async fn explanation_request(&self, session_id: &SessionId, user_message: Option<String>) -> Result<()> {
        self.sessions.dispatch(session_id, Command::ExplanationRequest { user_message }).await
    }

    pub async fn explanation_rating(&self, session_id: &SessionId, explanation_id: Uuid, rating: i32) -> Result<()> {
        self.sessions.dispatch(session_id, Command::ExplanationRating { explanation_id, rating }).await
    }

    pub async fn subscribe(&self, session_id: &SessionId) -> Result<tokio::sync::broadcast::Receiver<RuntimeEvent>> {
        self.sessions.subscribe(session_id).await
    }

    pub async fn record_socket(&self, session_id: &SessionId, socket_id: impl Into<String>) -> Result<()> {
        self.sessions.record_socket(session_id, socket_id).await
    }

    /// `GET /game-data` (spec.md §6): the static config overlaid with the
    /// session's current device values and `environment.time.gameStart`,
    /// plus the task list enriched with `abortionOptions`/`abortable`/
    /// `environment` (spec.md §4.7).
    pub async fn game_data(&self, session_id: &SessionId) -> Result<GameDataResponse> {
        let session = self.store.get_session(session_id)?.ok_or_else(|| Error::not_found(format!("session '{session_id}'")))?;
        if session.is_completed {
            return Err(Error::precondition(format!("session '{session_id}' is already completed")));
        }

        let snapshot = self.sessions.game_data(session_id).await?;
        let tasks = self.enrich_tasks(&snapshot.tasks);
        let game_config = self.game_config_json(&snapshot.devices, session.start_time);

        Ok(GameDataResponse { game_config, tasks })
    }

    /// Enriches a raw task batch with config-derived
    /// `abortionOptions`/`abortable`/`environment`, for forwarding a
    /// `game-update` push's `updatedTasks` over the wire (spec.md §4.7).
    pub fn enrich_tasks(&self, tasks: &[studycore_types::Task]) -> Vec<EnrichedTask> {
        tasks.iter().map(|task| self.enrich_task(task)).collect()
    }

    fn enrich_task(&self, task: &studycore_types::Task) -> EnrichedTask {
        match self.config.task_by_id(&task.task_id) {
            Some(task_cfg) => EnrichedTask {
                task: task.clone(),
                abortion_options: task_cfg.abortion_options.clone(),
                abortable: self.config.task_abortable(task_cfg),
                environment: task_cfg.environment.clone(),
            },
            None => EnrichedTask { task: task.clone(), abortion_options: Vec::new(), abortable: true, environment: Vec::new() },
        }
    }

    fn game_config_json(&self, devices: &[studycore_types::Device], session_start: DateTime<Utc>) -> serde_json::Value {
        let devices_json: Vec<_> = devices
            .iter()
            .map(|device| {
                serde_json::json!({
                    "id": device.device_id.as_str(),
                    "interactions": device.interactions.iter().map(|i| serde_json::json!({
                        "name": i.name.as_str(),
                        "type": i.kind,
                        "value": i.value,
                    })).collect::<Vec<_>>(),
                })
            })
            .collect();

        let mut environment = serde_json::to_value(&self.config.environment).unwrap_or_default();
        if let Some(time) = environment.get_mut("time").and_then(|v| v.as_object_mut()) {
            time.insert("gameStart".to_string(), serde_json::json!(session_start.timestamp_millis()));
        }

        serde_json::json!({
            "devices": devices_json,
            "environment": environment,
            "explanation": { "allowUserMessage": self.explanation_config.raw.allow_user_message },
        })
    }
}

#[cfg(test)]
mod tests {
    use studycore_testing::World;

    use super::*;

    #[tokio::test]
    async fn create_verify_round_trips_until_completion() {
        let world = World::new();
        let session_id = World::new_session_id();

        world.core.create_session(session_id.clone(), HashMap::new()).await.unwrap();
        assert_eq!(world.core.verify_session(&session_id).await.unwrap(), (true, false));

        world.core.complete_session(&session_id).await.unwrap();
        assert_eq!(world.core.verify_session(&session_id).await.unwrap(), (false, true));
    }

    #[tokio::test]
    async fn verify_unknown_session_is_not_found() {
        let world = World::new();
        let err = world.core.verify_session(&World::new_session_id()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn create_twice_conflicts_on_the_still_active_session() {
        let world = World::new();
        let session_id = World::new_session_id();

        world.core.create_session(session_id.clone(), HashMap::new()).await.unwrap();
        let err = world.core.create_session(session_id, HashMap::new()).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    /// L2: `game-data` right after `create` returns the materialized task
    /// and the configured device default (`light.power == false`).
    #[tokio::test]
    async fn game_data_after_create_matches_materialized_defaults() {
        let world = World::new();
        let session_id = World::new_session_id();
        world.core.create_session(session_id.clone(), HashMap::new()).await.unwrap();

        let data = world.core.game_data(&session_id).await.unwrap();
        assert_eq!(data.tasks.len(), 1);
        assert_eq!(data.tasks[0].task.task_id, TaskId::from("T1"));
        assert!(!data.tasks[0].task.is_completed);
        assert_eq!(data.tasks[0].abortion_options, vec!["too hard".to_string(), "uninterested".to_string()]);

        let light = data.game_config["devices"].as_array().unwrap().iter().find(|d| d["id"] == "light").unwrap();
        let power = light["interactions"].as_array().unwrap().iter().find(|i| i["name"] == "power").unwrap();
        assert_eq!(power["value"], false);
    }

    #[tokio::test]
    async fn game_data_on_completed_session_is_rejected() {
        let world = World::new();
        let session_id = World::new_session_id();
        world.core.create_session(session_id.clone(), HashMap::new()).await.unwrap();
        world.core.complete_session(&session_id).await.unwrap();

        let err = world.core.game_data(&session_id).await.unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
    }
}
