use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use studycore_sdk::StudyCore;
use studycore_types::{Clock, SessionId};

use crate::clock::TestClock;
use crate::fixtures::{explanation_config_none, GameConfigFixture};

/// An in-memory `StudyCore` plus a settable clock, so the wall-clock-offset
/// scenarios of spec.md §8 run without a SQLite file on disk or real
/// sleeps for anything that reads `Clock::now()`.
pub struct World {
    pub core: Arc<StudyCore>,
    pub clock: Arc<TestClock>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// The default fixture: one device, one task, no rules, no
    /// explanation engine.
    pub fn new() -> Self {
        Self::with_configs(GameConfigFixture::new().build(), explanation_config_none())
    }

    pub fn with_game_config(game_config_json: String) -> Self {
        Self::with_configs(game_config_json, explanation_config_none())
    }

    pub fn with_configs(game_config_json: String, explanation_config_json: String) -> Self {
        let clock = Arc::new(TestClock::new(Utc::now()));
        let core = StudyCore::open_in_memory(&game_config_json, &explanation_config_json, clock.clone() as Arc<dyn Clock>)
            .expect("fixture config must load");
        Self { core: Arc::new(core), clock }
    }

    /// A fresh session id, unique per call, so parallel tests never
    /// collide on `Error::Conflict`.
    pub fn new_session_id() -> SessionId {
        SessionId::from(format!("test-session-{}", Uuid::new_v4()))
    }
}
