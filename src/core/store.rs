//! Namespace store handles.
//!
//! A [`Namespace`] owns the engine connection for one named database for the
//! length of a single command. All reads and writes go through
//! [`Namespace::with_txn`], which commits when the body succeeds and rolls
//! back when it fails.

use crate::core::address;
use crate::core::db;
use crate::core::error::StashError;
use crate::core::registry::Registry;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default time a transaction waits on another process's lock before failing.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Create the namespace directory when it is missing.
    Create,
    /// Fail with [`StashError::NamespaceMissing`] when the directory is missing.
    Existing,
}

#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub busy_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
        }
    }
}

/// Open handle on one namespace.
#[derive(Debug)]
pub struct Namespace {
    name: String,
    dir: PathBuf,
    conn: Connection,
}

impl Namespace {
    pub fn open(
        registry: &Registry,
        name: &str,
        mode: OpenMode,
        opts: &StoreOptions,
    ) -> Result<Self, StashError> {
        let name = address::effective_name(name).to_string();
        let dir = registry.namespace_path(&name)?;
        if !dir.is_dir() {
            match mode {
                OpenMode::Existing => return Err(StashError::NamespaceMissing(name)),
                OpenMode::Create => {
                    fs::create_dir_all(&dir)?;
                    tracing::info!(namespace = %name, dir = %dir.display(), "created namespace");
                }
            }
        }
        let conn = db::db_connect(&dir, opts.busy_timeout)?;
        tracing::debug!(namespace = %name, "opened namespace");
        Ok(Self { name, dir, conn })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside one transaction.
    ///
    /// Write transactions take the engine's write lock up front, so a second
    /// writer fails after the busy timeout instead of interleaving.
    pub fn with_txn<F, R>(&mut self, read_only: bool, f: F) -> Result<R, StashError>
    where
        F: FnOnce(&Txn<'_>) -> Result<R, StashError>,
    {
        let behavior = if read_only {
            TransactionBehavior::Deferred
        } else {
            TransactionBehavior::Immediate
        };
        let tx = self.conn.transaction_with_behavior(behavior)?;
        let txn = Txn {
            conn: &*tx,
            read_only,
        };

        match f(&txn) {
            Ok(value) => {
                tx.commit()?;
                tracing::debug!(namespace = %self.name, read_only, "transaction committed");
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    tracing::warn!(
                        namespace = %self.name,
                        error = %rollback_err,
                        "rollback failed"
                    );
                }
                tracing::debug!(namespace = %self.name, error = %err, "transaction discarded");
                Err(err)
            }
        }
    }

    /// Make every committed write visible to the next reader.
    pub fn sync(&self) -> Result<(), StashError> {
        db::checkpoint(&self.conn)
    }

    /// Close the engine connection, reporting close failures.
    pub fn close(self) -> Result<(), StashError> {
        let name = self.name;
        self.conn.close().map_err(|(_, err)| StashError::RusqliteError(err))?;
        tracing::debug!(namespace = %name, "closed namespace");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOptions {
    pub reverse: bool,
    /// Skip reading value bytes entirely.
    pub keys_only: bool,
}

/// A live transaction. Obtained only through [`Namespace::with_txn`].
pub struct Txn<'a> {
    conn: &'a Connection,
    read_only: bool,
}

impl Txn<'_> {
    fn ensure_writable(&self) -> Result<(), StashError> {
        if self.read_only {
            return Err(StashError::Engine("transaction is read-only".to_string()));
        }
        Ok(())
    }

    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>, StashError> {
        let value: Option<Vec<u8>> = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        value.ok_or_else(|| StashError::KeyNotFound(String::from_utf8_lossy(key).to_string()))
    }

    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<(), StashError> {
        self.ensure_writable()?;
        self.conn.execute(
            "INSERT INTO kv(key, value) VALUES(?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Delete `key`. Deleting an absent key is not an error.
    pub fn delete(&self, key: &[u8]) -> Result<(), StashError> {
        self.ensure_writable()?;
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Copy entries from the attached database `schema` whose keys are absent here.
    /// Returns the number of entries imported.
    pub(crate) fn import_missing(&self, schema: &str) -> Result<usize, StashError> {
        self.ensure_writable()?;
        let sql = format!(
            "INSERT OR IGNORE INTO kv(key, value) SELECT key, value FROM {}.kv",
            schema
        );
        Ok(self.conn.execute(&sql, [])?)
    }

    pub fn count(&self) -> Result<u64, StashError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    /// Stream entries in byte order to `visit`, one row at a time.
    ///
    /// `visit` receives `None` for the value when `keys_only` is set.
    /// Returns the number of entries visited.
    pub fn scan<F>(&self, opts: ScanOptions, mut visit: F) -> Result<usize, StashError>
    where
        F: FnMut(&[u8], Option<&[u8]>) -> Result<(), StashError>,
    {
        let sql = match (opts.keys_only, opts.reverse) {
            (false, false) => "SELECT key, value FROM kv ORDER BY key ASC",
            (false, true) => "SELECT key, value FROM kv ORDER BY key DESC",
            (true, false) => "SELECT key FROM kv ORDER BY key ASC",
            (true, true) => "SELECT key FROM kv ORDER BY key DESC",
        };
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        let mut visited = 0;
        while let Some(row) = rows.next()? {
            let key = blob(row.get_ref(0)?)?;
            if opts.keys_only {
                visit(key, None)?;
            } else {
                visit(key, Some(blob(row.get_ref(1)?)?))?;
            }
            visited += 1;
        }
        Ok(visited)
    }
}

fn blob(value: ValueRef<'_>) -> Result<&[u8], StashError> {
    match value {
        ValueRef::Blob(b) | ValueRef::Text(b) => Ok(b),
        other => Err(StashError::Engine(format!(
            "unexpected column type {:?}",
            other.data_type()
        ))),
    }
}
