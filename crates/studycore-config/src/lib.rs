//! Parses and validates the static `game`/`explanation` JSON configuration
//! that drives a study session. Loading is the only place invalid
//! configuration is rejected; everything downstream assumes a `GameConfig`
//! is internally consistent.

pub mod loader;
pub mod schema;

pub use loader::{load_explanation_config, load_game_config, ExplanationConfig, GameConfig};
