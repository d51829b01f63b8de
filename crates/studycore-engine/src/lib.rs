//! Pure evaluation functions for the rule engine and goal checker: no I/O,
//! no store access. Callers (studycore-runtime) hand in a device snapshot
//! and get back a decision.

pub mod gametime;
pub mod goals;
pub mod precondition;
pub mod rules;
pub mod stateless;

pub use gametime::{game_clock_face, game_clock_string, in_game_time};
pub use goals::goals_met;
pub use rules::eligible_rules;
pub use stateless::apply_stateless_action;
