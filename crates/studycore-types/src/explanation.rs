use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids::{SessionId, TaskId};

/// A human-facing rationale produced by the explanation engine, integrated
/// or external.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    pub explanation_id: Uuid,
    pub explanation: String,
    pub created_at: DateTime<Utc>,
    pub user_session_id: SessionId,
    pub task_id: TaskId,
    pub delay: Option<f64>,
    pub rating: Option<i32>,
}

impl Explanation {
    pub fn new(
        text: impl Into<String>,
        created_at: DateTime<Utc>,
        user_session_id: SessionId,
        task_id: TaskId,
        delay: Option<f64>,
    ) -> Self {
        Self {
            explanation_id: Uuid::new_v4(),
            explanation: text.into(),
            created_at,
            user_session_id,
            task_id,
            delay,
            rating: None,
        }
    }
}
