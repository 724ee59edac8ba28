// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Master configuration
//!
//! Resolved once at startup from a TOML file and passed explicitly into
//! the journal and master constructors.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration for a master process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TernConfig {
    /// Name used in diagnostics and for the daemon's state directory
    pub service_name: String,
    pub journal: JournalConfig,
    pub tailer: TailerConfig,
}

/// Where and how the journal is stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JournalConfig {
    /// Directory holding the checkpoint and log segments
    pub dir: PathBuf,
    /// Size after which the writer seals the current segment and starts a new one
    pub max_segment_bytes: u64,
}

/// Cadence of the standby tailer loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TailerConfig {
    /// Delay between polls of the journal for newly completed segments
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Upper bound of the retry delay after transient storage errors
    #[serde(with = "humantime_serde")]
    pub max_backoff: Duration,
}

impl Default for TernConfig {
    fn default() -> Self {
        Self {
            service_name: "namespace".to_string(),
            journal: JournalConfig::default(),
            tailer: TailerConfig::default(),
        }
    }
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("journal"),
            max_segment_bytes: 8 * 1024 * 1024,
        }
    }
}

impl JournalConfig {
    /// Journal configuration rooted at the given directory
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }
}

impl Default for TailerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl TernConfig {
    /// Load and validate configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;

        // Relative journal directories are relative to the config file
        if config.journal.dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.journal.dir = parent.join(&config.journal.dir);
            }
        }

        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::Invalid("service_name must not be empty".into()));
        }
        if self.journal.max_segment_bytes == 0 {
            return Err(ConfigError::Invalid(
                "journal.max_segment_bytes must be positive".into(),
            ));
        }
        if self.tailer.poll_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "tailer.poll_interval must be positive".into(),
            ));
        }
        if self.tailer.max_backoff < self.tailer.poll_interval {
            return Err(ConfigError::Invalid(
                "tailer.max_backoff must not be shorter than tailer.poll_interval".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "master_tests.rs"]
mod tests;
