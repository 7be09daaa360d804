// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator configuration
//!
//! Loaded from TOML. Every field has a default so an empty file is valid:
//!
//! ```toml
//! [locks]
//! timeout = "10s"
//! poll_interval = "50ms"
//!
//! [executor]
//! poll_interval = "30s"
//! keep_job_logs = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub locks: LockSettings,
    pub executor: ExecutorSettings,
}

impl Config {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

/// Bounds on waiting for advisory locks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockSettings {
    /// Give up acquiring a lock after this long
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Retry cadence while waiting
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(50),
        }
    }
}

impl LockSettings {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Short bounds suitable for tests
    pub fn for_testing() -> Self {
        Self {
            timeout: Duration::from_millis(200),
            poll_interval: Duration::from_millis(5),
        }
    }
}

/// Pipeline executor behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorSettings {
    /// Delay between runtime cycles when driven by the manager loop
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Keep job log directories after a successful run
    pub keep_job_logs: bool,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            keep_job_logs: false,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
