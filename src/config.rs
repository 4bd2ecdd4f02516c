//! Configuration.
//!
//! Settings come from, lowest priority first:
//! - built-in defaults
//! - a TOML file (`--config PATH`, or `ccreplay.toml` in the working directory)
//! - the `CCREPLAY_CLEARTOOL` environment variable
//!
//! Command-line flags are applied on top by the binary.

use std::path::{Path, PathBuf};

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::changeset::DEFAULT_WINDOW_SECS;
use crate::error::{Error, Result};
use crate::history::DEFAULT_COMMENT_SENTINEL;

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "ccreplay.toml";

/// Environment variable naming the cleartool executable.
pub const CLEARTOOL_ENV: &str = "CCREPLAY_CLEARTOOL";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub cleartool: CleartoolConfig,
    pub history: HistoryConfig,
    pub grouping: GroupingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CleartoolConfig {
    /// Executable to run
    pub program: String,
}

impl Default for CleartoolConfig {
    fn default() -> Self {
        Self {
            program: "cleartool".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistoryConfig {
    /// Line that terminates each check-in comment in history output
    pub comment_sentinel: String,

    /// Only consider versions on this branch
    pub branch: Option<String>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            comment_sentinel: DEFAULT_COMMENT_SENTINEL.to_string(),
            branch: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GroupingConfig {
    /// Check-ins closer than this many seconds may share a changeset
    pub window_secs: i64,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            window_secs: DEFAULT_WINDOW_SECS,
        }
    }
}

impl GroupingConfig {
    pub fn window(&self) -> Result<TimeDelta> {
        window_from_secs(self.window_secs)
    }
}

/// Grouping window of `secs` seconds; zero, negative and out-of-range values are rejected.
pub fn window_from_secs(secs: i64) -> Result<TimeDelta> {
    if secs <= 0 {
        return Err(Error::InvalidWindow { secs });
    }
    TimeDelta::try_seconds(secs).ok_or(Error::InvalidWindow { secs })
}

impl Config {
    /// Parse a config from TOML content.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.grouping.window()?;
        Ok(config)
    }

    /// Load config from all sources.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::read(path)?,
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::read(&default)?
                } else {
                    Self::default()
                }
            }
        };

        if let Ok(program) = std::env::var(CLEARTOOL_ENV) {
            if !program.is_empty() {
                config.cleartool.program = program;
            }
        }

        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "reading config");
        let content = std::fs::read_to_string(path).map_err(|e| Error::ReadConfig {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml(&content)
    }
}
