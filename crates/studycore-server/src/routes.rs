use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use studycore_types::{Error, SessionId, Value};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub session_id: String,
    #[serde(default)]
    pub custom_data: HashMap<String, Value>,
    /// Accepted but not persisted — the data model carries no field for
    /// either (spec.md §3).
    #[serde(default, rename = "userAgent")]
    pub user_agent: Option<String>,
    #[serde(default, rename = "screenSize")]
    pub screen_size: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub success: bool,
    pub session_id: String,
}

/// `POST /session` (spec.md §6).
pub async fn create_session(State(state): State<AppState>, Json(req): Json<CreateSessionRequest>) -> Result<Json<CreateSessionResponse>, ApiError> {
    if req.session_id.trim().is_empty() {
        return Err(ApiError(Error::validation("session_id is required")));
    }
    let session_id = SessionId::from(req.session_id.clone());
    state.core.create_session(session_id, req.custom_data).await?;
    Ok(Json(CreateSessionResponse { success: true, session_id: req.session_id }))
}

#[derive(Debug, Deserialize)]
pub struct SessionIdBody {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct VerifySessionResponse {
    pub valid: bool,
    /// Always absent: this core has exactly one scenario per config, so
    /// there is nothing to report here beyond the literal wire shape.
    #[serde(skip_serializing_if = "Option::is_none", rename = "currentScenario")]
    pub current_scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "experimentGroup")]
    pub experiment_group: Option<String>,
}

/// `POST /session/verify` (spec.md §6, round-trip law L1).
pub async fn verify_session(State(state): State<AppState>, Json(req): Json<SessionIdBody>) -> Result<Json<VerifySessionResponse>, ApiError> {
    if req.session_id.trim().is_empty() {
        return Err(ApiError(Error::validation("session_id is required")));
    }
    let session_id = SessionId::from(req.session_id);
    let (valid, _completed) = state.core.verify_session(&session_id).await?;
    Ok(Json(VerifySessionResponse { valid, current_scenario: None, experiment_group: None }))
}

#[derive(Debug, Serialize)]
pub struct CompleteSessionResponse {
    pub success: bool,
}

/// `POST /session/complete` (spec.md §6).
pub async fn complete_session(State(state): State<AppState>, Json(req): Json<SessionIdBody>) -> Result<Json<CompleteSessionResponse>, ApiError> {
    let session_id = SessionId::from(req.session_id);
    state.core.complete_session(&session_id).await?;
    Ok(Json(CompleteSessionResponse { success: true }))
}

#[derive(Debug, Deserialize)]
pub struct GameDataQuery {
    pub session_id: String,
}

/// `GET /game-data?session_id=…` (spec.md §6). A completed session is a
/// distinct 404 shape (`{session_completed: true}`), not the generic
/// error envelope every other route uses.
pub async fn game_data(State(state): State<AppState>, Query(query): Query<GameDataQuery>) -> Response {
    let session_id = SessionId::from(query.session_id);
    match state.core.game_data(&session_id).await {
        Ok(data) => Json(data).into_response(),
        Err(Error::Precondition(_)) => (StatusCode::NOT_FOUND, Json(json!({"session_completed": true}))).into_response(),
        Err(err) => ApiError(err).into_response(),
    }
}
