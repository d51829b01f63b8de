use std::sync::Arc;

use studycore_sdk::StudyCore;

#[derive(Clone)]
pub struct AppState {
    pub core: Arc<StudyCore>,
}
