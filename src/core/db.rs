use crate::core::error::StashError;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File holding one namespace's data inside its directory.
pub const KV_DB_NAME: &str = "kv.sqlite3";

pub const KV_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS kv (
    key BLOB PRIMARY KEY NOT NULL,
    value BLOB NOT NULL
) WITHOUT ROWID";

pub fn kv_db_path(namespace_dir: &Path) -> PathBuf {
    namespace_dir.join(KV_DB_NAME)
}

/// Open the engine file inside `namespace_dir` with WAL journaling and the given busy timeout.
pub fn db_connect(namespace_dir: &Path, busy_timeout: Duration) -> Result<Connection, StashError> {
    let conn = Connection::open(kv_db_path(namespace_dir))?;
    conn.busy_timeout(busy_timeout)
        .map_err(StashError::RusqliteError)?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))
        .map_err(StashError::RusqliteError)?;
    conn.execute(KV_SCHEMA, [])
        .map_err(StashError::RusqliteError)?;
    Ok(conn)
}

/// Flush the write-ahead log into the main database file.
pub fn checkpoint(conn: &Connection) -> Result<(), StashError> {
    conn.query_row("PRAGMA wal_checkpoint(FULL);", [], |_| Ok(()))
        .map_err(StashError::RusqliteError)
}
