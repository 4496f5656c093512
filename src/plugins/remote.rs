//! Remote mirror for `sync` and `reset`.
//!
//! A remote holds one snapshot per namespace plus a manifest recording its
//! checksum. Snapshots are verified before anything is read from them.

use crate::core::db;
use crate::core::error::StashError;
use crate::core::registry::Registry;
use crate::core::store::{Namespace, OpenMode, StoreOptions};
use rusqlite::params;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub const MANIFEST_NAME: &str = "manifest.json";

/// Schema name the remote snapshot is attached under while pulling.
const ATTACH_AS: &str = "remote";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub namespace: String,
    /// Seconds since the Unix epoch.
    pub pushed_at: u64,
    pub entries: u64,
    pub sha256: String,
}

/// A place a namespace can be mirrored to and restored from.
pub trait Remote {
    /// Whether the remote holds a copy of namespace `name`.
    fn has_copy(&self, name: &str) -> bool;
    /// Publish the current state of `ns`.
    fn push(&self, ns: &mut Namespace) -> Result<Manifest, StashError>;
    /// Import remote entries whose keys are missing locally. Returns how many were imported.
    fn pull(&self, ns: &mut Namespace) -> Result<usize, StashError>;
    /// Replace the local namespace `name` with the remote copy. No handle on it may be open.
    fn reset(
        &self,
        registry: &Registry,
        name: &str,
        opts: &StoreOptions,
    ) -> Result<Manifest, StashError>;

    /// Pull (when a remote copy exists), then push. Returns the number of
    /// imported entries and the manifest of the new remote copy.
    fn sync(&self, ns: &mut Namespace) -> Result<(usize, Manifest), StashError> {
        let imported = if self.has_copy(ns.name()) {
            self.pull(ns)?
        } else {
            0
        };
        let manifest = self.push(ns)?;
        Ok((imported, manifest))
    }
}

/// Remote backed by a directory, e.g. a mounted share.
#[derive(Debug, Clone)]
pub struct DirRemote {
    root: PathBuf,
}

impl DirRemote {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn namespace_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn snapshot_path(&self, name: &str) -> PathBuf {
        db::kv_db_path(&self.namespace_dir(name))
    }

    pub fn load_manifest(&self, name: &str) -> Result<Manifest, StashError> {
        let path = self.namespace_dir(name).join(MANIFEST_NAME);
        if !path.exists() {
            return Err(StashError::Remote(format!(
                "no remote copy of \"@{}\" in {}",
                name,
                self.root.display()
            )));
        }
        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content)
            .map_err(|e| StashError::Remote(format!("bad manifest {}: {}", path.display(), e)))
    }

    /// Manifest and snapshot path, after checking the snapshot against the manifest.
    pub fn verify(&self, name: &str) -> Result<(Manifest, PathBuf), StashError> {
        let manifest = self.load_manifest(name)?;
        let snapshot = self.snapshot_path(name);
        if !snapshot.exists() {
            return Err(StashError::Remote(format!(
                "snapshot missing at {}",
                snapshot.display()
            )));
        }
        if hash_file(&snapshot)? != manifest.sha256 {
            return Err(StashError::Remote(format!(
                "checksum mismatch for \"@{}\"",
                name
            )));
        }
        Ok((manifest, snapshot))
    }
}

impl Remote for DirRemote {
    fn has_copy(&self, name: &str) -> bool {
        self.namespace_dir(name).join(MANIFEST_NAME).exists()
    }

    fn push(&self, ns: &mut Namespace) -> Result<Manifest, StashError> {
        let dir = self.namespace_dir(ns.name());
        fs::create_dir_all(&dir)?;
        let staging = dir.join(format!("{}.incoming", db::KV_DB_NAME));
        if staging.exists() {
            fs::remove_file(&staging)?;
        }

        ns.sync()?;
        ns.conn()
            .execute("VACUUM INTO ?1", params![staging.to_string_lossy()])?;
        let entries = ns.with_txn(true, |txn| txn.count())?;

        let manifest = Manifest {
            namespace: ns.name().to_string(),
            pushed_at: unix_now(),
            entries,
            sha256: hash_file(&staging)?,
        };
        fs::rename(&staging, self.snapshot_path(ns.name()))?;
        let json = serde_json::to_string_pretty(&manifest)
            .map_err(|e| StashError::Remote(e.to_string()))?;
        fs::write(dir.join(MANIFEST_NAME), json)?;

        tracing::info!(namespace = ns.name(), entries, "pushed namespace");
        Ok(manifest)
    }

    fn pull(&self, ns: &mut Namespace) -> Result<usize, StashError> {
        let (_, snapshot) = self.verify(ns.name())?;
        ns.conn().execute(
            &format!("ATTACH DATABASE ?1 AS {}", ATTACH_AS),
            params![snapshot.to_string_lossy()],
        )?;

        let imported = ns.with_txn(false, |txn| txn.import_missing(ATTACH_AS));
        let detached = ns
            .conn()
            .execute(&format!("DETACH DATABASE {}", ATTACH_AS), []);
        let imported = imported?;
        detached?;

        tracing::info!(namespace = ns.name(), imported, "pulled namespace");
        Ok(imported)
    }

    fn reset(
        &self,
        registry: &Registry,
        name: &str,
        opts: &StoreOptions,
    ) -> Result<Manifest, StashError> {
        let local = registry.namespace_path(name)?;
        let (manifest, snapshot) = self.verify(name)?;
        fs::create_dir_all(&local)?;

        let target = db::kv_db_path(&local);
        let incoming = local.join(format!("{}.incoming", db::KV_DB_NAME));
        fs::copy(&snapshot, &incoming)?;
        // Stale WAL frames would be replayed over the restored file.
        for suffix in ["-wal", "-shm"] {
            let path = PathBuf::from(format!("{}{}", target.display(), suffix));
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        fs::rename(&incoming, &target)?;

        // Reopen once so the restored file is put back into WAL mode.
        Namespace::open(registry, name, OpenMode::Existing, opts)?.close()?;
        tracing::info!(namespace = name, entries = manifest.entries, "reset namespace from remote");
        Ok(manifest)
    }
}

pub fn hash_file(path: &Path) -> Result<String, StashError> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
