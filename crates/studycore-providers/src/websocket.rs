use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::{FutureExt, SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use studycore_types::{LogEntry, MetadataSnapshot, Result, SessionId};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::traits::{ExplanationContext, ExplanationEngine, ExplanationSink};

#[derive(Serialize)]
struct UserLogFrame<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(flatten)]
    metadata: &'a MetadataSnapshot,
    log: &'a LogEntry,
}

#[derive(Deserialize)]
struct ExplanationReceival {
    user_id: SessionId,
    explanation: String,
}

/// `mode == external`, `transport == websocket`: one connection opened at
/// construction and owned by a background task for the engine's whole
/// lifetime, not one per call. Log entries are forwarded out as
/// `user_log` frames; `explanation_receival` frames arrive asynchronously
/// and are routed to the originating session through `sink`, the same
/// registry the runtime uses for inbound client events (spec.md §6,
/// §4.7).
pub struct WebSocketEngine {
    outbound: mpsc::UnboundedSender<String>,
}

impl WebSocketEngine {
    pub fn new(url: String, sink: Arc<dyn ExplanationSink>) -> Self {
        let (outbound, inbound) = mpsc::unbounded_channel();
        tokio::spawn(run_connection(url, inbound, sink));
        Self { outbound }
    }

    fn send_frame(&self, snapshot: &MetadataSnapshot, payload: impl Serialize) {
        match serde_json::to_string(&payload) {
            Ok(text) => {
                if self.outbound.send(text).is_err() {
                    tracing::warn!(user_id = %snapshot.user_id, "explanation engine websocket connection is closed");
                }
            }
            Err(err) => tracing::warn!(%err, "failed to serialize explanation engine frame"),
        }
    }
}

/// Owns the socket for as long as it stays open: pulls frames queued by
/// `notify` out to the wire, and dispatches every inbound
/// `explanation_receival` to `sink`. Exits without retrying on connect
/// failure or a closed/errored stream; the engine is selected once at
/// startup and never swapped mid-session, so reconnecting isn't this
/// type's job.
async fn run_connection(url: String, mut inbound: mpsc::UnboundedReceiver<String>, sink: Arc<dyn ExplanationSink>) {
    let (socket, _) = match tokio_tungstenite::connect_async(&url).await {
        Ok(pair) => pair,
        Err(err) => {
            tracing::error!(%url, %err, "explanation engine websocket connect failed");
            return;
        }
    };
    let (mut write, mut read) = socket.split();

    loop {
        tokio::select! {
            outgoing = inbound.recv() => {
                let Some(payload) = outgoing else { break };
                if let Err(err) = write.send(Message::Text(payload)).await {
                    tracing::warn!(%err, "explanation engine websocket send failed");
                }
            }
            incoming = read.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => dispatch_receival(&text, sink.as_ref()).await,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        tracing::warn!(%err, "explanation engine websocket recv failed");
                        break;
                    }
                    None => break,
                }
            }
        }
    }
}

async fn dispatch_receival(text: &str, sink: &dyn ExplanationSink) {
    match serde_json::from_str::<ExplanationReceival>(text) {
        Ok(frame) => sink.deliver(&frame.user_id, frame.explanation).await,
        Err(err) => tracing::warn!(%err, "explanation engine sent a malformed explanation_receival frame"),
    }
}

impl ExplanationEngine for WebSocketEngine {
    fn name(&self) -> &'static str {
        "websocket"
    }

    /// Explanations from this transport arrive asynchronously as
    /// `explanation_receival` frames and are routed through `sink`, not
    /// returned from a request/response round trip, so there is nothing
    /// synchronous to await here.
    fn generate<'a>(&'a self, _ctx: &'a ExplanationContext) -> BoxFuture<'a, Result<Option<String>>> {
        async { Ok(None) }.boxed()
    }

    fn notify<'a>(&'a self, snapshot: &'a MetadataSnapshot, logs: &'a [LogEntry]) -> BoxFuture<'a, ()> {
        async move {
            let Some(log) = logs.last() else { return };
            self.send_frame(snapshot, UserLogFrame { kind: "user_log", metadata: snapshot, log });
        }
        .boxed()
    }
}
