use futures_util::future::BoxFuture;
use studycore_types::{Device, MetadataSnapshot, Result, SessionId};

/// Everything an explanation engine needs to produce a rationale: which
/// session is asking, the rule or on-demand request that triggered it,
/// the device snapshot at that moment, and the in-game clock face.
#[derive(Debug, Clone)]
pub struct ExplanationContext {
    pub user_id: SessionId,
    pub trigger_key: String,
    pub devices: Vec<Device>,
    pub game_clock: String,
    pub user_message: Option<String>,
}

/// Capability interface every explanation transport implements:
/// integrated canned text, an external REST call, an external WebSocket
/// round trip, or a no-op. Selected once at startup from
/// `explanation.mode` and never swapped mid-session.
pub trait ExplanationEngine: Send + Sync {
    fn name(&self) -> &'static str;

    fn generate<'a>(&'a self, ctx: &'a ExplanationContext) -> BoxFuture<'a, Result<Option<String>>>;

    /// Called on every Logger append (spec.md §4.6). The integrated/none
    /// engines have nothing to forward and no-op; the REST engine POSTs
    /// `{metadata…, logs}`, the WebSocket engine emits a `user_log` frame
    /// over its standing connection. Failures here must never roll back
    /// the log append that triggered them, so this returns nothing the
    /// caller could propagate — the implementation logs its own failures.
    fn notify<'a>(&'a self, snapshot: &'a MetadataSnapshot, logs: &'a [studycore_types::LogEntry]) -> BoxFuture<'a, ()>;
}

/// Where a background transport (currently just the WebSocket engine)
/// delivers an explanation that arrived without a matching in-flight
/// request — `explanation_receival` frames carry their own `user_id`, so
/// the transport routes by session id rather than returning a value to a
/// caller. Implemented by `studycore-runtime` over its session registry;
/// defined here (not there) because `studycore-providers` sits below
/// `studycore-runtime` in the dependency graph and can't depend on its
/// types.
pub trait ExplanationSink: Send + Sync {
    fn deliver<'a>(&'a self, session_id: &'a SessionId, explanation: String) -> BoxFuture<'a, ()>;
}
