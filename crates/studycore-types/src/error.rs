use std::fmt;

/// Result type used across every studycore crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by the whole core (`spec.md` §7).
///
/// These are kinds, not exception names: callers match on the variant to
/// decide how to surface the failure (HTTP status, silent drop for socket
/// events, a logged warning) rather than inspecting message text.
#[derive(Debug)]
pub enum Error {
    /// Missing/invalid request fields.
    Validation(String),
    /// Session/task/device referenced that does not exist for the caller.
    NotFound(String),
    /// Duplicate active session. Carries the existing session id.
    Conflict(String),
    /// Operation not applicable in the current state (already aborted,
    /// timeout requested before the actual end, bad abort option, ...).
    Precondition(String),
    /// External explanation engine unavailable or timed out.
    Dependency(String),
    /// Store failure or other unexpected internal condition.
    Internal(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    pub fn conflict(existing_session_id: impl Into<String>) -> Self {
        Error::Conflict(existing_session_id.into())
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        Error::Precondition(msg.into())
    }

    pub fn dependency(msg: impl Into<String>) -> Self {
        Error::Dependency(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Validation(msg) => write!(f, "validation error: {msg}"),
            Error::NotFound(msg) => write!(f, "not found: {msg}"),
            Error::Conflict(existing) => write!(f, "conflict, existing session: {existing}"),
            Error::Precondition(msg) => write!(f, "precondition failed: {msg}"),
            Error::Dependency(msg) => write!(f, "dependency error: {msg}"),
            Error::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(err.to_string())
    }
}
