use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use studycore_types::{LogEntry, MetadataSnapshot, Result};

use crate::traits::{ExplanationContext, ExplanationEngine};

/// `mode == none`: explanations are disabled for the session entirely.
pub struct NoneEngine;

impl ExplanationEngine for NoneEngine {
    fn name(&self) -> &'static str {
        "none"
    }

    fn generate<'a>(&'a self, _ctx: &'a ExplanationContext) -> BoxFuture<'a, Result<Option<String>>> {
        async { Ok(None) }.boxed()
    }

    fn notify<'a>(&'a self, _snapshot: &'a MetadataSnapshot, _logs: &'a [LogEntry]) -> BoxFuture<'a, ()> {
        async {}.boxed()
    }
}
