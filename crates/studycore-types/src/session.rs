use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::explanation::Explanation;
use crate::ids::SessionId;
use crate::value::Value;

/// One per participant-run. Terminal on `is_completed = true`; no task or
/// device mutation is accepted afterwards (invariant I1, spec.md §3/§8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: SessionId,
    pub start_time: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub is_completed: bool,
    pub completion_time: Option<DateTime<Utc>>,
    /// Participant attributes injected from an upstream survey.
    pub custom_data: HashMap<String, Value>,
    /// Last produced explanation, held for on-demand delivery
    /// (`on_demand` trigger policy, spec.md §4.7).
    pub explanation_cache: Option<Explanation>,
    /// Current client channel handle, if connected.
    pub socket_id: Option<String>,
}

impl Session {
    pub fn new(session_id: SessionId, start_time: DateTime<Utc>, custom_data: HashMap<String, Value>) -> Self {
        Self {
            session_id,
            start_time,
            last_activity: start_time,
            is_completed: false,
            completion_time: None,
            custom_data,
            explanation_cache: None,
            socket_id: None,
        }
    }
}
