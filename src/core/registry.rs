//! Database registry: where namespaces live on disk and which ones exist.
//!
//! Every namespace is one directory under `<data-root>/kv/`. The directory name
//! is the database name; there is no other metadata.

use crate::core::address;
use crate::core::error::StashError;
use std::fs;
use std::path::{Path, PathBuf};

/// Subdirectory of the data root holding one directory per namespace.
pub const KV_DIR: &str = "kv";

#[derive(Debug, Clone)]
pub struct Registry {
    /// Data root, e.g. `~/.local/share/stash`.
    pub root: PathBuf,
}

impl Registry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Registry rooted at the per-user data directory.
    pub fn from_env() -> Result<Self, StashError> {
        Ok(Self::new(data_root()?))
    }

    /// `<root>/kv`, created if missing.
    pub fn kv_dir(&self) -> Result<PathBuf, StashError> {
        let dir = self.root.join(KV_DIR);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Directory backing `name`. Empty names map to the default namespace.
    ///
    /// Every path handed out by the registry goes through here, so a name can
    /// never reach outside `<root>/kv/`.
    pub fn namespace_path(&self, name: &str) -> Result<PathBuf, StashError> {
        address::validate_db_name(name)?;
        Ok(self.kv_dir()?.join(address::effective_name(name)))
    }

    pub fn exists(&self, name: &str) -> Result<bool, StashError> {
        Ok(self.namespace_path(name)?.is_dir())
    }

    /// Names of all namespaces, sorted.
    pub fn list(&self) -> Result<Vec<String>, StashError> {
        let dir = self.kv_dir()?;
        let mut names = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Prefix every name with `@` for display.
pub fn format_dbs(names: &[String]) -> Vec<String> {
    names.iter().map(|n| format!("@{}", n)).collect()
}

/// Resolve the data root: `STASH_DATA_DIR`, then `$XDG_DATA_HOME/stash`,
/// then `$HOME/.local/share/stash`.
pub fn data_root() -> Result<PathBuf, StashError> {
    if let Some(dir) = non_empty_var("STASH_DATA_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Some(xdg) = non_empty_var("XDG_DATA_HOME") {
        return Ok(PathBuf::from(xdg).join("stash"));
    }
    match non_empty_var("HOME") {
        Some(home) => Ok(PathBuf::from(home).join(".local/share/stash")),
        None => Err(StashError::PathError(
            "cannot determine data directory: set STASH_DATA_DIR or HOME".to_string(),
        )),
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Replace a leading home directory with `~` for display.
pub fn home_relative(path: &Path) -> String {
    if let Some(home) = non_empty_var("HOME") {
        if let Ok(rest) = path.strip_prefix(&home) {
            return Path::new("~").join(rest).display().to_string();
        }
    }
    path.display().to_string()
}
