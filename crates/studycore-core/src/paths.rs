use std::path::PathBuf;

/// Resolve the directory the core stores its SQLite database and default
/// config files under, honoring `STUDYCORE_HOME` before falling back to
/// the platform data directory.
pub fn data_dir() -> PathBuf {
    if let Ok(explicit) = std::env::var("STUDYCORE_HOME") {
        return PathBuf::from(explicit);
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("studycore")
}

pub fn default_db_path() -> PathBuf {
    data_dir().join("study.sqlite3")
}
