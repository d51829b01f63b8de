use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Process-level configuration for the study orchestration server: the
/// two static config files, the database path, the bind address, and
/// nothing else — secrets are out of scope (spec.md §6).
#[derive(Debug, Parser)]
#[command(name = "studycore-server", about = "Server-side study orchestration core")]
pub struct Args {
    /// Address the HTTP/WS listener binds to.
    #[arg(long, default_value = "0.0.0.0:8080")]
    pub bind: String,

    /// Path to the static `game` config JSON.
    #[arg(long)]
    pub game_config: PathBuf,

    /// Path to the static `explanation` config JSON.
    #[arg(long)]
    pub explanation_config: PathBuf,

    /// SQLite database file. Defaults to `STUDYCORE_HOME`'s (or the
    /// platform data directory's) `studycore/study.sqlite3` if unset.
    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

impl Args {
    pub fn resolved_db_path(&self) -> PathBuf {
        self.db_path.clone().unwrap_or_else(studycore_core::default_db_path)
    }
}
