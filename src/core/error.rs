use crate::core::resolver::Suggestions;
use rusqlite;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StashError {
    #[error("{0}")]
    Format(String),
    #[error("{}, {suggestions}", describe_missing(.name))]
    DatabaseNotFound {
        name: String,
        suggestions: Suggestions,
    },
    #[error("Namespace does not exist: {0}")]
    NamespaceMissing(String),
    #[error("Key not found: {0}")]
    KeyNotFound(String),
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Engine error: {0}")]
    Engine(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Path error: {0}")]
    PathError(String),
    #[error("Remote error: {0}")]
    Remote(String),
}

fn describe_missing(name: &str) -> String {
    if name.is_empty() {
        "no database specified".to_string()
    } else {
        format!("\"@{}\" does not exist", name)
    }
}

impl StashError {
    /// True for the engine's busy/locked failures, i.e. another process holds the write lock.
    pub fn is_busy(&self) -> bool {
        match self {
            StashError::RusqliteError(rusqlite::Error::SqliteFailure(code, _)) => matches!(
                code.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}
