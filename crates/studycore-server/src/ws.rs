use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value as Json};
use studycore_sdk::{RuntimeEvent, StudyCore};
use studycore_types::{DeviceId, InteractionName, SessionId, TaskId, Value};
use uuid::Uuid;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SocketQuery {
    pub session_id: String,
}

/// The duplex channel of spec.md §4.7: one `WebSocket` per client, bound
/// to a single session for the connection's lifetime.
pub async fn socket_handler(ws: WebSocketUpgrade, Query(query): Query<SocketQuery>, State(state): State<AppState>) -> impl IntoResponse {
    let session_id = SessionId::from(query.session_id);
    ws.on_upgrade(move |socket| handle_socket(socket, state, session_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, session_id: SessionId) {
    let mut events = match state.core.subscribe(&session_id).await {
        Ok(events) => events,
        Err(err) => {
            tracing::debug!(session_id = %session_id, %err, "socket connected to an unknown or completed session");
            return;
        }
    };

    let socket_id = Uuid::new_v4().to_string();
    if let Err(err) = state.core.record_socket(&session_id, socket_id).await {
        tracing::debug!(session_id = %session_id, %err, "could not record socket id");
        return;
    }

    let (mut sink, mut stream) = socket.split();
    let outbound_core = state.core.clone();

    let mut outbound = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let payload = encode_event(&outbound_core, event);
                    if sink.send(Message::Text(payload)).await.is_err() {
                        break;
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let inbound_core = state.core.clone();
    let inbound_session = session_id.clone();
    let mut inbound = tokio::spawn(async move {
        while let Some(Ok(message)) = stream.next().await {
            if let Message::Text(text) = message {
                if let Err(err) = dispatch_inbound(&inbound_core, &inbound_session, &text).await {
                    tracing::debug!(session_id = %inbound_session, %err, "dropping socket event");
                }
            }
        }
    });

    tokio::select! {
        _ = &mut outbound => inbound.abort(),
        _ = &mut inbound => outbound.abort(),
    }
}

/// `GameUpdate`'s task list is enriched with config-derived fields before
/// going over the wire (spec.md §4.7); every other push serializes as-is.
fn encode_event(core: &StudyCore, event: RuntimeEvent) -> String {
    match event {
        RuntimeEvent::GameUpdate { updated_tasks, updated_properties, message } => {
            let enriched = core.enrich_tasks(&updated_tasks);
            json!({
                "type": "game-update",
                "updatedTasks": enriched,
                "updatedProperties": updated_properties,
                "message": message,
            })
            .to_string()
        }
        other => serde_json::to_string(&other).unwrap_or_else(|_| "{}".to_string()),
    }
}

/// Dispatches one inbound frame of spec.md §4.7's inbound table. Every
/// error here — malformed JSON, unknown type, a `StudyCore` rejection —
/// is dropped silently per the event bus's propagation policy; the
/// `Result` only exists so the caller can log it at debug level.
async fn dispatch_inbound(core: &StudyCore, session_id: &SessionId, text: &str) -> Result<(), String> {
    let frame: Json = serde_json::from_str(text).map_err(|e| e.to_string())?;
    let event_type = frame.get("type").and_then(Json::as_str).ok_or("missing \"type\" field")?;

    match event_type {
        "game-start" => core.game_start(session_id).await.map_err(|e| e.to_string()),
        "device-interaction" => {
            let device = field_str(&frame, "device")?;
            let interaction = field_str(&frame, "interaction")?;
            let value = field_value(&frame, "value")?.ok_or("missing \"value\" field")?;
            core.device_interaction(session_id, DeviceId::from(device), InteractionName::from(interaction), value).await.map_err(|e| e.to_string())
        }
        "game-interaction" => {
            // The pass-through payload's own `type` would collide with the
            // envelope discriminator above, so it travels under
            // `interactionType` instead (spec.md §4.7, open question).
            let kind = field_str(&frame, "interactionType")?;
            let data = field_value(&frame, "data")?.unwrap_or(Value::Json(Json::Null));
            core.game_interaction(session_id, kind, data).await.map_err(|e| e.to_string())
        }
        "task-timeout" => {
            let task_id = field_str(&frame, "task_id")?;
            core.task_timeout(session_id, TaskId::from(task_id)).await.map_err(|e| e.to_string())
        }
        "task-abort" => {
            let task_id = field_str(&frame, "task_id")?;
            let option = field_str(&frame, "abortOption")?;
            core.task_abort(session_id, TaskId::from(task_id), option).await.map_err(|e| e.to_string())
        }
        "explanation_request" => {
            let user_message = frame.get("userMessage").and_then(Json::as_str).map(str::to_string);
            core.explanation_request(session_id, user_message).await.map_err(|e| e.to_string())
        }
        "explanation_rating" => {
            let explanation_id = field_str(&frame, "explanation_id")?;
            let explanation_id = Uuid::parse_str(&explanation_id).map_err(|e| e.to_string())?;
            let rating = frame.get("rating").and_then(Json::as_i64).ok_or("missing \"rating\" field")? as i32;
            core.explanation_rating(session_id, explanation_id, rating).await.map_err(|e| e.to_string())
        }
        other => Err(format!("unknown socket event type \"{other}\"")),
    }
}

fn field_str(frame: &Json, name: &str) -> Result<String, String> {
    frame.get(name).and_then(Json::as_str).map(str::to_string).ok_or_else(|| format!("missing \"{name}\" field"))
}

fn field_value(frame: &Json, name: &str) -> Result<Option<Value>, String> {
    match frame.get(name) {
        Some(raw) => serde_json::from_value::<Value>(raw.clone()).map(Some).map_err(|e| e.to_string()),
        None => Ok(None),
    }
}
