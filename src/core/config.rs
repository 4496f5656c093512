//! User configuration loaded from `config.toml` in the data root.
//!
//! A missing file is not an error; every field has a default.

use crate::core::error::StashError;
use crate::core::resolver::{DEFAULT_THRESHOLD, SuggestStrategy};
use crate::core::store::{DEFAULT_BUSY_TIMEOUT_MS, StoreOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SuggestMode {
    #[default]
    LengthBound,
    ThresholdPrefix,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    /// Mirror directory used by `sync` and `reset`.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub busy_timeout_ms: u64,
    pub suggest: SuggestMode,
    pub suggest_threshold: usize,
    pub remote: RemoteConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            suggest: SuggestMode::LengthBound,
            suggest_threshold: DEFAULT_THRESHOLD,
            remote: RemoteConfig::default(),
        }
    }
}

impl Config {
    pub fn suggest_strategy(&self) -> SuggestStrategy {
        match self.suggest {
            SuggestMode::LengthBound => SuggestStrategy::LengthBound,
            SuggestMode::ThresholdPrefix => SuggestStrategy::ThresholdPrefix {
                max_distance: self.suggest_threshold,
            },
        }
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
        }
    }
}

/// Config file location: `STASH_CONFIG` when set, otherwise `<data_root>/config.toml`.
pub fn config_path(data_root: &Path) -> PathBuf {
    match std::env::var("STASH_CONFIG") {
        Ok(p) if !p.trim().is_empty() => PathBuf::from(p),
        _ => data_root.join(CONFIG_FILE_NAME),
    }
}

pub fn load_config(path: &Path) -> Result<Config, StashError> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(path).map_err(StashError::IoError)?;
    let config: Config = toml::from_str(&content)
        .map_err(|e| StashError::Config(format!("{}: {}", path.display(), e)))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}
