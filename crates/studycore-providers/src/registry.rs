use std::sync::Arc;

use studycore_config::schema::{EngineMode, Transport};
use studycore_config::ExplanationConfig;
use studycore_types::{Error, Result};

use crate::integrated::IntegratedEngine;
use crate::none::NoneEngine;
use crate::rest::RestEngine;
use crate::traits::{ExplanationEngine, ExplanationSink};
use crate::websocket::WebSocketEngine;

/// Builds the one `ExplanationEngine` a session uses for its lifetime,
/// selected from `explanation.mode`/`explanation.engine.transport`. A
/// WebSocket engine needs `sink` to route asynchronously-arriving
/// `explanation_receival` frames back to the owning session; the other
/// transports never use it.
pub fn build_engine(config: ExplanationConfig, sink: Arc<dyn ExplanationSink>) -> Result<Box<dyn ExplanationEngine>> {
    match config.raw.mode {
        EngineMode::None => Ok(Box::new(NoneEngine)),
        EngineMode::Integrated => Ok(Box::new(IntegratedEngine::new(config))),
        EngineMode::External => {
            let engine_cfg = config.raw.engine.clone().ok_or_else(|| {
                Error::validation("explanation.mode == external requires an engine transport")
            })?;
            match engine_cfg.transport {
                Transport::Rest => Ok(Box::new(RestEngine::new(engine_cfg.url, engine_cfg.timeout_seconds))),
                Transport::Websocket => Ok(Box::new(WebSocketEngine::new(engine_cfg.url, sink))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures_util::future::BoxFuture;
    use futures_util::FutureExt;
    use studycore_types::SessionId;

    use super::*;

    struct NoopSink;
    impl ExplanationSink for NoopSink {
        fn deliver<'a>(&'a self, _session_id: &'a SessionId, _explanation: String) -> BoxFuture<'a, ()> {
            async {}.boxed()
        }
    }

    fn noop_sink() -> Arc<dyn ExplanationSink> {
        Arc::new(NoopSink)
    }

    #[test]
    fn none_mode_builds_none_engine() {
        let json = r#"{"trigger":"on_demand","mode":"none","allowUserMessage":false,"texts":{}}"#;
        let config = studycore_config::load_explanation_config(json).unwrap();
        let engine = build_engine(config, noop_sink()).unwrap();
        assert_eq!(engine.name(), "none");
    }

    #[test]
    fn external_rest_mode_builds_rest_engine() {
        let json = r#"{
            "trigger":"automatic","mode":"external","allowUserMessage":false,"texts":{},
            "engine": {"transport": "rest", "url": "http://localhost:9000"}
        }"#;
        let config = studycore_config::load_explanation_config(json).unwrap();
        let engine = build_engine(config, noop_sink()).unwrap();
        assert_eq!(engine.name(), "rest");
    }

    #[tokio::test]
    async fn external_websocket_mode_builds_websocket_engine() {
        let json = r#"{
            "trigger":"automatic","mode":"external","allowUserMessage":false,"texts":{},
            "engine": {"transport": "websocket", "url": "ws://localhost:9000"}
        }"#;
        let config = studycore_config::load_explanation_config(json).unwrap();
        let engine = build_engine(config, noop_sink()).unwrap();
        assert_eq!(engine.name(), "websocket");
    }
}
