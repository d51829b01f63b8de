use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use studycore_config::ExplanationConfig;
use studycore_types::{LogEntry, MetadataSnapshot, Result};

use crate::traits::{ExplanationContext, ExplanationEngine};

/// `mode == integrated`: looks `trigger_key` up in the canned-text table
/// loaded from `explanation.json`. No network calls.
pub struct IntegratedEngine {
    config: ExplanationConfig,
}

impl IntegratedEngine {
    pub fn new(config: ExplanationConfig) -> Self {
        Self { config }
    }
}

impl ExplanationEngine for IntegratedEngine {
    fn name(&self) -> &'static str {
        "integrated"
    }

    fn generate<'a>(&'a self, ctx: &'a ExplanationContext) -> BoxFuture<'a, Result<Option<String>>> {
        let text = self.config.canned_text(&ctx.trigger_key).map(|s| s.to_string());
        async move { Ok(text) }.boxed()
    }

    fn notify<'a>(&'a self, _snapshot: &'a MetadataSnapshot, _logs: &'a [LogEntry]) -> BoxFuture<'a, ()> {
        async {}.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_configured_key() {
        let json = r#"{"trigger":"automatic","mode":"integrated","allowUserMessage":false,"texts":{"lamp_on":"The lamp turned on because it is dark."}}"#;
        let config = studycore_config::load_explanation_config(json).unwrap();
        let engine = IntegratedEngine::new(config);
        let ctx = ExplanationContext {
            user_id: studycore_types::SessionId::from("s1"),
            trigger_key: "lamp_on".to_string(),
            devices: vec![],
            game_clock: "20:00".to_string(),
            user_message: None,
        };
        let result = block_on(engine.generate(&ctx));
        assert_eq!(result.unwrap(), Some("The lamp turned on because it is dark.".to_string()));
    }

    fn block_on<F: std::future::Future>(f: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
    }
}
