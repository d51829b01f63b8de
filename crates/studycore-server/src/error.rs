use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use studycore_types::Error;

/// Wraps the shared error taxonomy so it can implement axum's
/// `IntoResponse` without tripping the orphan rule (spec.md §7).
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self.0 {
            Error::Validation(msg) => (StatusCode::BAD_REQUEST, json!({"error": "missing-fields", "message": msg})),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, json!({"error": "not-found", "message": msg})),
            Error::Conflict(existing) => (
                StatusCode::CONFLICT,
                json!({"existingSessionId": existing, "currentScenario": Option::<String>::None}),
            ),
            Error::Precondition(msg) => (StatusCode::BAD_REQUEST, json!({"error": "precondition", "message": msg})),
            Error::Dependency(msg) => {
                tracing::warn!(%msg, "explanation engine dependency error");
                (StatusCode::BAD_GATEWAY, json!({"error": "dependency", "message": msg}))
            }
            Error::Internal(msg) => {
                tracing::error!(%msg, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "internal"}))
            }
        };
        (status, Json(body)).into_response()
    }
}
