//! SQLite-backed persistence. Every session's sessions/tasks/devices/logs/
//! explanations live behind one guarded `Connection`, matching the
//! single-connection-per-process convention used elsewhere in this stack.

pub mod db;

pub use db::Store;
