use std::collections::HashMap;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use studycore_providers::ExplanationSink;
use studycore_types::{Error, Result, SessionId};

use crate::command::Command;
use crate::events::RuntimeEvent;
use crate::executor::SessionHandle;

/// Every live session's executor handle, keyed by session id. The one
/// place that installs or removes a handle; a session's own command
/// stream never takes this lock (spec.md §5). Doubles as the
/// `ExplanationSink` a background WebSocket explanation engine forwards
/// `explanation_receival` frames through, since routing an inbound
/// explanation to "the owning session's command queue" is exactly what
/// this map already does for every other inbound event.
pub struct SessionRegistry {
    sessions: tokio::sync::Mutex<HashMap<SessionId, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self { sessions: tokio::sync::Mutex::new(HashMap::new()) }
    }

    pub async fn insert(&self, session_id: SessionId, handle: SessionHandle) {
        self.sessions.lock().await.insert(session_id, handle);
    }

    pub async fn remove(&self, session_id: &SessionId) -> Option<SessionHandle> {
        self.sessions.lock().await.remove(session_id)
    }

    pub async fn dispatch(&self, session_id: &SessionId, command: Command) -> Result<()> {
        let sessions = self.sessions.lock().await;
        let handle = sessions.get(session_id).ok_or_else(|| Error::not_found(format!("session '{session_id}'")))?;
        handle.sender.send(command).map_err(|_| Error::not_found(format!("session '{session_id}' executor has shut down")))
    }

    pub async fn subscribe(&self, session_id: &SessionId) -> Result<tokio::sync::broadcast::Receiver<RuntimeEvent>> {
        let sessions = self.sessions.lock().await;
        let handle = sessions.get(session_id).ok_or_else(|| Error::not_found(format!("session '{session_id}'")))?;
        Ok(handle.bus.subscribe())
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ExplanationSink for SessionRegistry {
    fn deliver<'a>(&'a self, session_id: &'a SessionId, explanation: String) -> BoxFuture<'a, ()> {
        async move {
            let command = Command::ExternalExplanation { explanation };
            if self.dispatch(session_id, command).await.is_err() {
                tracing::warn!(%session_id, "explanation_receival arrived for an unknown or completed session");
            }
        }
        .boxed()
    }
}
