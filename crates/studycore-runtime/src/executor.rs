use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::sync::mpsc;
use uuid::Uuid;

use studycore_config::{schema::EngineMode, schema::TriggerPolicy, ExplanationConfig, GameConfig};
use studycore_providers::{ExplanationContext, ExplanationEngine};
use studycore_store::Store;
use studycore_types::{
    Clock, Device, DeviceId, Explanation, InteractionName, InteractionType, LogEntryKind, Result,
    RuleAction, SessionId, Task, TaskId, Value,
};

use crate::command::{Command, GameDataSnapshot};
use crate::device_store;
use crate::events::{EventBus, RuntimeEvent, UpdatedProperty};
use crate::logger;
use crate::scheduler;

/// Handle a running session's actor holds for the rest of the process:
/// the command queue's send side and the push-event fan-out. Dropping
/// every clone of the sender closes the executor's receive loop.
pub struct SessionHandle {
    pub sender: mpsc::UnboundedSender<Command>,
    pub bus: Arc<EventBus>,
}

/// Owns a session's live in-memory task/device state and processes its
/// command queue one message at a time (spec.md §5). No other task ever
/// touches `tasks`/`devices` directly; every mutation flows through here.
struct Executor {
    session_id: SessionId,
    config: Arc<GameConfig>,
    explanation_config: Arc<ExplanationConfig>,
    engine: Arc<dyn ExplanationEngine>,
    store: Arc<Store>,
    clock: Arc<dyn Clock>,
    bus: Arc<EventBus>,
    receiver: mpsc::UnboundedReceiver<Command>,
    sender: mpsc::UnboundedSender<Command>,
    tasks: Vec<Task>,
    devices: Vec<Device>,
    session_start: DateTime<Utc>,
    custom_data: HashMap<String, Value>,
}

#[allow(clippy::too_many_arguments)]
pub fn spawn(
    session_id: SessionId,
    config: Arc<GameConfig>,
    explanation_config: Arc<ExplanationConfig>,
    engine: Arc<dyn ExplanationEngine>,
    store: Arc<Store>,
    clock: Arc<dyn Clock>,
    session_start: DateTime<Utc>,
    custom_data: HashMap<String, Value>,
) -> Result<SessionHandle> {
    let tasks = store.get_tasks(&session_id)?;
    let devices = store.get_devices(&session_id)?;
    let (sender, receiver) = mpsc::unbounded_channel();
    let bus = Arc::new(EventBus::new());

    let executor = Executor {
        session_id,
        config,
        explanation_config,
        engine,
        store,
        clock,
        bus: bus.clone(),
        receiver,
        sender: sender.clone(),
        tasks,
        devices,
        session_start,
        custom_data,
    };
    tokio::spawn(executor.run());

    Ok(SessionHandle { sender, bus })
}

impl Executor {
    async fn run(mut self) {
        while let Some(cmd) = self.receiver.recv().await {
            if matches!(cmd, Command::Shutdown) {
                break;
            }
            let now = self.clock.now();
            self.reconcile(now).await;
            self.dispatch(now, cmd).await;
        }
    }

    async fn dispatch(&mut self, now: DateTime<Utc>, cmd: Command) {
        match cmd {
            Command::Shutdown => {}
            Command::GameStart => self.handle_game_start(now).await,
            Command::DeviceInteraction { device, interaction, value } => {
                self.handle_device_interaction(now, device, interaction, value).await
            }
            Command::GameInteraction { kind, data } => self.handle_game_interaction(now, kind, data).await,
            Command::TaskTimeout { task_id } => self.handle_task_timeout(now, task_id).await,
            Command::TaskAbort { task_id, option } => self.handle_task_abort(now, task_id, option).await,
            Command::ExplanationRequest { user_message } => self.handle_explanation_request(now, user_message).await,
            Command::ExplanationRating { explanation_id, rating } => self.handle_explanation_rating(explanation_id, rating),
            Command::DelayedRuleAction { rule_id: _, action } => self.apply_rule_action(now, action).await,
            Command::ExternalExplanation { explanation } => self.handle_external_explanation(now, explanation).await,
            Command::GameData { respond_to } => {
                let _ = respond_to.send(GameDataSnapshot { tasks: self.tasks.clone(), devices: self.devices.clone() });
            }
        }
    }

    /// Lazy timeout reconciliation, run before every command (spec.md
    /// §4.3). Each transitioned task gets the same cascade a client-driven
    /// transition would.
    async fn reconcile(&mut self, now: DateTime<Utc>) {
        for idx in scheduler::reconcile_timeouts(&mut self.tasks, now) {
            let task_id = self.tasks[idx].task_id.clone();
            self.finalize_transition(idx, now, LogEntryKind::TaskTimeout, json!({ "task_id": task_id.as_str() })).await;
        }
    }

    async fn handle_game_start(&mut self, now: DateTime<Utc>) {
        let Ok(logs) = self.store.list_logs(&self.session_id) else { return };
        if !logs.is_empty() {
            return;
        }
        if let Some(current) = scheduler::current_task(&self.tasks, now) {
            let task_id = current.task_id.clone();
            self.log(LogEntryKind::TaskBegin, json!({ "task_id": task_id.as_str() }), now).await;
        }
    }

    async fn handle_device_interaction(&mut self, now: DateTime<Utc>, device: DeviceId, interaction: InteractionName, value: Value) {
        let kind = device_store::interaction_kind(&self.config, &device, &interaction).unwrap_or(InteractionType::Generic);
        let stateless = kind.is_stateless();

        if !stateless {
            device_store::apply(&mut self.devices, &device, &interaction, kind, value.clone());
            self.persist_device(&device);
        }

        self.log(
            LogEntryKind::DeviceInteraction,
            json!({ "device": device.as_str(), "interaction": interaction.as_str(), "value": value.clone() }),
            now,
        )
        .await;

        if let Some(idx) = self.tasks.iter().position(|t| t.is_current_at(now)) {
            self.tasks[idx].interaction_times += 1;
            self.persist_task(idx);
        }

        let snapshot = if stateless {
            studycore_engine::apply_stateless_action(&self.devices, &device, &interaction)
        } else {
            self.devices.clone()
        };

        self.run_rules(now, &snapshot).await;
        self.check_goals(now).await;
    }

    async fn handle_game_interaction(&mut self, now: DateTime<Utc>, kind: String, data: Value) {
        self.log(LogEntryKind::from_str(&kind), json!({ "data": data }), now).await;
    }

    async fn handle_task_timeout(&mut self, now: DateTime<Utc>, task_id: TaskId) {
        let Some(idx) = self.tasks.iter().position(|t| t.task_id == task_id) else { return };
        if self.tasks[idx].is_terminal() || self.tasks[idx].end_time > now {
            return;
        }
        self.tasks[idx].is_timed_out = true;
        self.tasks[idx].duration = Some(self.tasks[idx].configured_duration().num_milliseconds() as f64 / 1000.0);
        scheduler::retime_following(&mut self.tasks, idx, now);
        self.tasks[idx].completion_time = Some(now);
        self.tasks[idx].end_time = now;
        self.finalize_transition(idx, now, LogEntryKind::TaskTimeout, json!({ "task_id": task_id.as_str() })).await;
    }

    /// Abort is rejected (silently, per the inbound-event drop policy) if
    /// the task is already terminal or the option isn't one of the
    /// task's configured `abortionOptions` (boundary B4).
    async fn handle_task_abort(&mut self, now: DateTime<Utc>, task_id: TaskId, option: String) {
        let Some(idx) = self.tasks.iter().position(|t| t.task_id == task_id) else { return };
        if self.tasks[idx].is_terminal() {
            return;
        }
        let Some(task_cfg) = self.config.task_by_id(&task_id) else { return };
        if !task_cfg.abortion_options.iter().any(|o| o == &option) {
            return;
        }
        scheduler::abort_task(&mut self.tasks, idx, now, option.clone());
        self.finalize_transition(idx, now, LogEntryKind::AbortTask, json!({ "task_id": task_id.as_str(), "option": option })).await;
    }

    fn handle_explanation_rating(&mut self, explanation_id: Uuid, rating: i32) {
        let Ok(explanations) = self.store.list_explanations(&self.session_id) else { return };
        if let Some(mut explanation) = explanations.into_iter().find(|e| e.explanation_id == explanation_id) {
            explanation.rating = Some(rating);
            let _ = self.store.put_explanation(&self.session_id, &explanation);
        }
    }

    async fn handle_explanation_request(&mut self, now: DateTime<Utc>, user_message: Option<String>) {
        match self.explanation_config.raw.mode {
            EngineMode::None => self.push_fallback_explanation(),
            EngineMode::Integrated => self.push_cached_explanation(),
            EngineMode::External => self.request_external_explanation(now, user_message).await,
        }
    }

    fn push_fallback_explanation(&self) {
        self.bus.publish(RuntimeEvent::Explanation {
            explanation: "no explanation available right now".to_string(),
            explanation_id: Uuid::new_v4(),
            rating: None,
        });
    }

    fn push_cached_explanation(&mut self) {
        let Ok(Some(mut session)) = self.store.get_session(&self.session_id) else { return };
        match session.explanation_cache.take() {
            Some(cached) => {
                tracing::debug!(session_id = %self.session_id, explanation_id = %cached.explanation_id, "delivering cached explanation");
                let _ = self.store.put_explanation(&self.session_id, &cached);
                self.bus.publish(RuntimeEvent::Explanation {
                    explanation: cached.explanation.clone(),
                    explanation_id: cached.explanation_id,
                    rating: cached.rating,
                });
                let _ = self.store.put_session(&session);
            }
            None => self.push_fallback_explanation(),
        }
    }

    async fn request_external_explanation(&mut self, now: DateTime<Utc>, user_message: Option<String>) {
        let ctx = ExplanationContext {
            user_id: self.session_id.clone(),
            trigger_key: "on_demand".to_string(),
            devices: self.devices.clone(),
            game_clock: self.game_clock_at(now),
            user_message,
        };
        match self.engine.generate(&ctx).await {
            Ok(Some(text)) => {
                let task_id = self.current_or_first_task_id(now);
                let explanation = Explanation::new(text, now, self.session_id.clone(), task_id, None);
                tracing::debug!(session_id = %self.session_id, explanation_id = %explanation.explanation_id, "delivering explanation from external engine");
                let _ = self.store.put_explanation(&self.session_id, &explanation);
                self.bus.publish(RuntimeEvent::Explanation {
                    explanation: explanation.explanation,
                    explanation_id: explanation.explanation_id,
                    rating: None,
                });
            }
            Ok(None) => self.push_fallback_explanation(),
            Err(err) => {
                tracing::warn!(session_id = %self.session_id, %err, "external explanation engine request failed");
                self.push_fallback_explanation();
            }
        }
    }

    /// An `explanation_receival` frame the WebSocket explanation engine
    /// pushed asynchronously, routed here via the session registry rather
    /// than a `generate()` reply (spec.md §6).
    async fn handle_external_explanation(&mut self, now: DateTime<Utc>, explanation: String) {
        let task_id = self.current_or_first_task_id(now);
        let explanation = Explanation::new(explanation, now, self.session_id.clone(), task_id, None);
        tracing::debug!(session_id = %self.session_id, explanation_id = %explanation.explanation_id, "delivering explanation pushed by external engine");
        let _ = self.store.put_explanation(&self.session_id, &explanation);
        self.bus.publish(RuntimeEvent::Explanation {
            explanation: explanation.explanation,
            explanation_id: explanation.explanation_id,
            rating: None,
        });
    }

    async fn run_rules(&mut self, now: DateTime<Utc>, snapshot: &[Device]) {
        let context = self.build_context(now);
        let game_time = studycore_engine::in_game_time(now, self.session_start, self.config.time_config());
        let eligible: Vec<_> = studycore_engine::eligible_rules(self.config.rules_in_order(), snapshot, game_time, &context)
            .into_iter()
            .cloned()
            .collect();

        for rule in eligible {
            let device_actions: Vec<&RuleAction> =
                rule.action.iter().filter(|a| matches!(a, RuleAction::DeviceInteraction { .. })).collect();
            tracing::debug!(session_id = %self.session_id, rule_id = %rule.id, "rule fired");
            self.log(LogEntryKind::RuleTrigger, json!({ "rule_id": rule.id.as_str(), "actions": device_actions }), now).await;

            let delay = rule.delay_seconds();
            for action in rule.action.clone() {
                if delay <= 0.0 {
                    self.apply_rule_action(now, action).await;
                } else {
                    self.schedule_delayed(rule.id.clone(), action, delay);
                }
            }
        }
    }

    async fn apply_rule_action(&mut self, now: DateTime<Utc>, action: RuleAction) {
        match action {
            RuleAction::DeviceInteraction { device, interaction, value } => {
                let kind = device_store::interaction_kind(&self.config, &device, &interaction).unwrap_or(InteractionType::Generic);
                device_store::apply(&mut self.devices, &device, &interaction, kind, value.clone());
                self.persist_device(&device);
                self.bus.publish(RuntimeEvent::UpdateInteraction { device_id: device, interaction, value });
                self.check_goals(now).await;
            }
            RuleAction::Explanation { key } => self.handle_rule_explanation(now, &key).await,
        }
    }

    async fn handle_rule_explanation(&mut self, now: DateTime<Utc>, key: &str) {
        if self.explanation_config.raw.mode != EngineMode::Integrated {
            return;
        }
        let ctx = ExplanationContext {
            user_id: self.session_id.clone(),
            trigger_key: key.to_string(),
            devices: self.devices.clone(),
            game_clock: self.game_clock_at(now),
            user_message: None,
        };
        let text = match self.engine.generate(&ctx).await {
            Ok(Some(text)) => text,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(session_id = %self.session_id, %err, trigger_key = key, "rule-triggered explanation request failed");
                return;
            }
        };
        let task_id = self.current_or_first_task_id(now);
        let explanation = Explanation::new(text, now, self.session_id.clone(), task_id, None);

        match self.explanation_config.raw.trigger {
            TriggerPolicy::Automatic => {
                tracing::debug!(session_id = %self.session_id, explanation_id = %explanation.explanation_id, trigger_key = key, "delivering rule-triggered explanation");
                let _ = self.store.put_explanation(&self.session_id, &explanation);
                self.bus.publish(RuntimeEvent::Explanation {
                    explanation: explanation.explanation,
                    explanation_id: explanation.explanation_id,
                    rating: None,
                });
            }
            TriggerPolicy::OnDemand => {
                tracing::debug!(session_id = %self.session_id, explanation_id = %explanation.explanation_id, trigger_key = key, "caching rule-triggered explanation for on-demand delivery");
                if let Ok(Some(mut session)) = self.store.get_session(&self.session_id) {
                    session.explanation_cache = Some(explanation);
                    let _ = self.store.put_session(&session);
                }
            }
        }
    }

    async fn check_goals(&mut self, now: DateTime<Utc>) {
        let Some(idx) = self.tasks.iter().position(|t| t.is_current_at(now)) else { return };
        let Some(task_cfg) = self.config.task_by_id(&self.tasks[idx].task_id).cloned() else { return };
        if studycore_engine::goals_met(&task_cfg.goals, &self.devices) {
            scheduler::complete_task(&mut self.tasks, idx, now);
            self.finalize_transition(idx, now, LogEntryKind::TaskCompleted, json!({ "task_id": task_cfg.id.as_str() })).await;
        }
    }

    /// Shared tail of every terminal transition: log it, apply the next
    /// task's `defaultDeviceProperties` and log its `TASK_BEGIN`, persist,
    /// and push `game-update` (spec.md §4.3/§4.7).
    async fn finalize_transition(&mut self, idx: usize, now: DateTime<Utc>, kind: LogEntryKind, metadata: serde_json::Value) {
        self.log(kind, metadata, now).await;
        self.persist_task(idx);

        tracing::info!(
            session_id = %self.session_id,
            task_id = %self.tasks[idx].task_id,
            kind = kind.as_str(),
            "task transitioned"
        );

        let next_idx = idx + 1;
        let updated_properties = if next_idx < self.tasks.len() {
            let updated = self.cascade_into(next_idx);
            let next_id = self.tasks[next_idx].task_id.clone();
            self.log(LogEntryKind::TaskBegin, json!({ "task_id": next_id.as_str() }), now).await;
            self.persist_task(next_idx);
            updated
        } else {
            Vec::new()
        };

        let touched: HashSet<&DeviceId> = updated_properties.iter().map(|p| &p.device_id).collect();
        for device_id in touched {
            self.persist_device(device_id);
        }

        self.bus.publish(RuntimeEvent::GameUpdate {
            updated_tasks: self.tasks.clone(),
            updated_properties,
            message: None,
        });
    }

    fn cascade_into(&mut self, idx: usize) -> Vec<UpdatedProperty> {
        let Some(task_cfg) = self.config.task_by_id(&self.tasks[idx].task_id).cloned() else { return Vec::new() };
        task_cfg
            .default_device_properties
            .into_iter()
            .map(|prop| {
                let kind = device_store::interaction_kind(&self.config, &prop.device, &prop.interaction).unwrap_or(InteractionType::Generic);
                device_store::apply(&mut self.devices, &prop.device, &prop.interaction, kind, prop.value.clone());
                UpdatedProperty { device_id: prop.device, interaction: prop.interaction, value: prop.value }
            })
            .collect()
    }

    fn schedule_delayed(&self, rule_id: studycore_types::RuleId, action: RuleAction, delay_seconds: f64) {
        let sender = self.sender.clone();
        let duration = std::time::Duration::from_secs_f64(delay_seconds.max(0.0));
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let _ = sender.send(Command::DelayedRuleAction { rule_id, action });
        });
    }

    fn build_context(&self, now: DateTime<Utc>) -> HashMap<String, Value> {
        let mut ctx = self.custom_data.clone();
        ctx.insert("time".to_string(), Value::Text(self.game_clock_at(now)));
        if let Some(task) = scheduler::current_task(&self.tasks, now) {
            ctx.insert("task".to_string(), Value::Text(task.task_id.as_str().to_string()));
        }
        ctx
    }

    fn game_clock_at(&self, now: DateTime<Utc>) -> String {
        studycore_engine::game_clock_string(studycore_engine::in_game_time(now, self.session_start, self.config.time_config()))
    }

    fn current_or_first_task_id(&self, now: DateTime<Utc>) -> TaskId {
        scheduler::current_task(&self.tasks, now)
            .map(|t| t.task_id.clone())
            .unwrap_or_else(|| self.tasks[0].task_id.clone())
    }

    /// Targeted single-document upsert for one device, used instead of
    /// rewriting every device row on each mutation.
    fn persist_device(&self, device_id: &DeviceId) {
        let Some(device) = self.devices.iter().find(|d| &d.device_id == device_id) else { return };
        if let Err(err) = self.store.update_device(&self.session_id, device) {
            tracing::warn!(session_id = %self.session_id, %device_id, %err, "failed to persist device state");
        }
    }

    /// Targeted single-document update for one task, used instead of
    /// rewriting the whole task list on each transition.
    fn persist_task(&self, idx: usize) {
        if let Err(err) = self.store.update_task(&self.session_id, &self.tasks[idx]) {
            tracing::warn!(session_id = %self.session_id, task_id = %self.tasks[idx].task_id, %err, "failed to persist task state");
        }
    }

    /// (1) append the log entry; (2) build a metadata snapshot of the
    /// state as of that entry; (3) notify the explanation engine. Engine
    /// failures never roll back the append — `ExplanationEngine::notify`
    /// has no error to propagate, only its own logging (spec.md §4.6).
    async fn log(&self, kind: LogEntryKind, metadata: serde_json::Value, now: DateTime<Utc>) {
        let entry = logger::entry(kind, metadata, self.session_start, now, self.session_id.clone());
        if let Err(err) = self.store.append_log(&self.session_id, &entry) {
            tracing::warn!(session_id = %self.session_id, %err, "failed to append log entry");
            return;
        }
        self.notify_engine(now).await;
    }

    async fn notify_engine(&self, now: DateTime<Utc>) {
        let logs = match self.store.list_logs(&self.session_id) {
            Ok(logs) => logs,
            Err(err) => {
                tracing::warn!(session_id = %self.session_id, %err, "failed to read back logs for explanation engine notification");
                return;
            }
        };
        let current_task = scheduler::current_task(&self.tasks, now).map(|t| &t.task_id);
        let snapshot =
            logger::metadata_snapshot(&self.session_id, current_task, &self.game_clock_at(now), &self.custom_data, &self.devices);
        self.engine.notify(&snapshot, &logs).await;
    }
}
