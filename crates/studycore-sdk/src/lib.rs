//! Public facade bundling `studycore-config`, `studycore-store`,
//! `studycore-providers` and `studycore-runtime` behind one client type —
//! the crate a server binary links against instead of the lower layers
//! directly.

pub mod client;
pub mod types;

pub use client::StudyCore;
pub use types::{EnrichedTask, GameDataResponse};

pub use studycore_runtime::{Command, GameDataSnapshot, RuntimeEvent, UpdatedProperty};
pub use studycore_types::{Error, Result};
