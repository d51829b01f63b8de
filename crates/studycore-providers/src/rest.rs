use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use studycore_types::{Error, LogEntry, MetadataSnapshot, Result, SessionId};

use crate::traits::{ExplanationContext, ExplanationEngine};

#[derive(Serialize)]
struct ExplainRequest<'a> {
    user_id: &'a SessionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_message: &'a Option<String>,
}

#[derive(Deserialize)]
struct ExplainResponse {
    success: bool,
    explanation: Option<String>,
}

#[derive(Serialize)]
struct LogNotification<'a> {
    #[serde(flatten)]
    metadata: &'a MetadataSnapshot,
    logs: &'a [LogEntry],
}

/// `mode == external`, `transport == rest`: `POST {engine_url}/explain`
/// per explanation request, `POST {engine_url}/log` per Logger append
/// (spec.md §6, §4.6).
pub struct RestEngine {
    client: reqwest::Client,
    url: String,
}

impl RestEngine {
    pub fn new(url: String, timeout_seconds: Option<f64>) -> Self {
        let timeout = Duration::from_secs_f64(timeout_seconds.unwrap_or(5.0).max(0.1));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client configuration is static and always valid");
        Self { client, url }
    }
}

impl ExplanationEngine for RestEngine {
    fn name(&self) -> &'static str {
        "rest"
    }

    fn generate<'a>(&'a self, ctx: &'a ExplanationContext) -> BoxFuture<'a, Result<Option<String>>> {
        async move {
            let body = ExplainRequest { user_id: &ctx.user_id, user_message: &ctx.user_message };
            let response = self
                .client
                .post(format!("{}/explain", self.url))
                .json(&body)
                .send()
                .await
                .map_err(|e| Error::dependency(format!("explanation engine request failed: {e}")))?;
            let response = response
                .error_for_status()
                .map_err(|e| Error::dependency(format!("explanation engine returned an error: {e}")))?;
            let parsed: ExplainResponse = response
                .json()
                .await
                .map_err(|e| Error::dependency(format!("explanation engine returned malformed JSON: {e}")))?;
            if !parsed.success {
                return Ok(None);
            }
            Ok(parsed.explanation)
        }
        .boxed()
    }

    fn notify<'a>(&'a self, snapshot: &'a MetadataSnapshot, logs: &'a [LogEntry]) -> BoxFuture<'a, ()> {
        async move {
            let body = LogNotification { metadata: snapshot, logs };
            let result = self.client.post(format!("{}/log", self.url)).json(&body).send().await;
            match result.and_then(|r| r.error_for_status()) {
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(user_id = %snapshot.user_id, %err, "explanation engine /log notification failed");
                }
            }
        }
        .boxed()
    }
}
