//! Pluggable explanation-engine adapters. One `ExplanationEngine` is
//! built at startup from `explanation.json` and shared by every session
//! for the process's lifetime; the transport never changes mid-session.

pub mod integrated;
pub mod none;
pub mod registry;
pub mod rest;
pub mod traits;
pub mod websocket;

pub use registry::build_engine;
pub use traits::{ExplanationContext, ExplanationEngine, ExplanationSink};
