use std::collections::HashMap;
use std::sync::Arc;

use studycore_config::{ExplanationConfig, GameConfig};
use studycore_providers::ExplanationEngine;
use studycore_store::Store;
use studycore_types::{Clock, Error, InteractionType, Result, Session, SessionId, Value};

use crate::command::{Command, GameDataSnapshot};
use crate::device_store;
use crate::events::RuntimeEvent;
use crate::executor;
use crate::registry::SessionRegistry;
use crate::scheduler;

/// Owns every live session's executor handle and is the one place that
/// creates, verifies, and completes sessions (spec.md §4.2). The
/// registry itself guards installing/removing a handle; a session's own
/// command stream never takes that lock (spec.md §5).
pub struct SessionManager {
    store: Arc<Store>,
    config: Arc<GameConfig>,
    explanation_config: Arc<ExplanationConfig>,
    engine: Arc<dyn ExplanationEngine>,
    clock: Arc<dyn Clock>,
    registry: Arc<SessionRegistry>,
}

impl SessionManager {
    pub fn new(
        store: Arc<Store>,
        config: Arc<GameConfig>,
        explanation_config: Arc<ExplanationConfig>,
        engine: Arc<dyn ExplanationEngine>,
        clock: Arc<dyn Clock>,
        registry: Arc<SessionRegistry>,
    ) -> Self {
        Self { store, config, explanation_config, engine, clock, registry }
    }

    /// Fails with `Error::Conflict` if a non-completed session with this
    /// id already exists. Materializes the task timeline, the device
    /// snapshot, and the first task's `defaultDeviceProperties` before
    /// spawning the session's executor.
    pub async fn create(&self, session_id: SessionId, custom_data: HashMap<String, Value>) -> Result<()> {
        if let Some(existing) = self.store.get_session(&session_id)? {
            if !existing.is_completed {
                return Err(Error::conflict(session_id.to_string()));
            }
        }

        let now = self.clock.now();
        let session = Session::new(session_id.clone(), now, custom_data.clone());
        self.store.put_session(&session)?;

        let tasks = scheduler::build_initial_tasks(&self.config, now);
        let mut devices = device_store::initial_devices(&self.config);
        if let Some(first) = tasks.first() {
            if let Some(task_cfg) = self.config.task_by_id(&first.task_id) {
                for prop in &task_cfg.default_device_properties {
                    let kind = device_store::interaction_kind(&self.config, &prop.device, &prop.interaction).unwrap_or(InteractionType::Generic);
                    device_store::apply(&mut devices, &prop.device, &prop.interaction, kind, prop.value.clone());
                }
            }
        }
        self.store.put_tasks(&session_id, &tasks)?;
        self.store.put_devices(&session_id, &devices)?;

        let handle = executor::spawn(
            session_id.clone(),
            self.config.clone(),
            self.explanation_config.clone(),
            self.engine.clone(),
            self.store.clone(),
            self.clock.clone(),
            now,
            custom_data,
        )?;
        self.registry.insert(session_id, handle).await;
        Ok(())
    }

    /// `(valid, completed)`. Bumps `last_activity` on a valid session.
    pub async fn verify(&self, session_id: &SessionId) -> Result<(bool, bool)> {
        match self.store.get_session(session_id)? {
            Some(mut session) if !session.is_completed => {
                session.last_activity = self.clock.now();
                self.store.put_session(&session)?;
                Ok((true, false))
            }
            Some(_) => Ok((false, true)),
            None => Err(Error::not_found(format!("session '{session_id}'"))),
        }
    }

    /// Records the connected client channel handle on the session record
    /// (spec.md §4.7, "record the client channel id on the session
    /// record"). A disconnect never clears this — only a later connection
    /// overwrites it.
    pub async fn record_socket(&self, session_id: &SessionId, socket_id: impl Into<String>) -> Result<()> {
        let mut session = self.store.get_session(session_id)?.ok_or_else(|| Error::not_found(format!("session '{session_id}'")))?;
        if session.is_completed {
            return Err(Error::precondition(format!("session '{session_id}' is already completed")));
        }
        session.socket_id = Some(socket_id.into());
        self.store.put_session(&session)
    }

    /// Idempotent only in the sense that a second call on an
    /// already-completed session fails with `NotFound`, matching spec.md
    /// §4.2. Tears down the executor, which drops every sender clone held
    /// by in-flight delayed-action timers, discarding them on fire.
    pub async fn complete(&self, session_id: &SessionId) -> Result<()> {
        let mut session = self.store.get_session(session_id)?.ok_or_else(|| Error::not_found(format!("session '{session_id}'")))?;
        if session.is_completed {
            return Err(Error::not_found(format!("session '{session_id}'")));
        }
        session.is_completed = true;
        session.completion_time = Some(self.clock.now());
        self.store.put_session(&session)?;

        if let Some(handle) = self.registry.remove(session_id).await {
            let _ = handle.sender.send(Command::Shutdown);
        }
        Ok(())
    }

    pub async fn dispatch(&self, session_id: &SessionId, command: Command) -> Result<()> {
        self.registry.dispatch(session_id, command).await
    }

    /// Current task/device snapshot, reconciled for timeouts as of now
    /// (spec.md §6, `/game-data`).
    pub async fn game_data(&self, session_id: &SessionId) -> Result<GameDataSnapshot> {
        let (respond_to, reply) = tokio::sync::oneshot::channel();
        self.dispatch(session_id, Command::GameData { respond_to }).await?;
        reply.await.map_err(|_| Error::internal("session executor dropped before answering game-data"))
    }

    pub async fn subscribe(&self, session_id: &SessionId) -> Result<tokio::sync::broadcast::Receiver<RuntimeEvent>> {
        self.registry.subscribe(session_id).await
    }
}
