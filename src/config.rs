//! Host configuration from `voxscript.json`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::graph::DEFAULT_BUILTIN_THRESHOLD;

pub const CONFIG_FILE: &str = "voxscript.json";

/// Compile and run limits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Statements executed per frame before the frame is aborted.
    pub max_steps: u64,
    /// Levels of custom blocks below the entry prefab.
    pub max_nesting_depth: usize,
    /// Nested program scopes active at once while running.
    pub max_call_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_steps: 100_000,
            max_nesting_depth: 32,
            max_call_depth: 32,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Block ids at or above this refer to custom prefabs.
    pub builtin_threshold: u16,
    pub limits: Limits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            builtin_threshold: DEFAULT_BUILTIN_THRESHOLD,
            limits: Limits::default(),
        }
    }
}

impl Config {
    /// Load a config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Find `voxscript.json` in `start_dir` or any of its ancestors.
    pub fn find(start_dir: &Path) -> Option<PathBuf> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.exists() {
                return Some(candidate);
            }
            if !dir.pop() {
                return None;
            }
        }
    }

    /// The config found from `start_dir`, or the defaults when there is none.
    pub fn discover(start_dir: &Path) -> Result<Config, ConfigError> {
        match Self::find(start_dir) {
            Some(path) => Self::load(&path),
            None => Ok(Config::default()),
        }
    }
}
