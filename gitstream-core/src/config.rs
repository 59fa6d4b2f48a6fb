//! Configuration management for GitStream
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Environment variables (GITSTREAM_*)
//! 2. Config file (~/.config/gitstream/config.toml)
//! 3. Default values
//!
//! The embedding process wires these values into [`crate::ReposDir`] and
//! [`crate::GitRepo`] through their builder methods; there is no process-wide
//! mutable configuration state.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default clone timeout in seconds
pub const DEFAULT_CLONE_TIMEOUT_SECS: u64 = 60;

/// Git-related configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GitConfig {
    /// Name or path of the git executable
    pub binary: String,

    /// Wall-clock timeout for clone operations (e.g. "60s", "2m")
    #[serde(with = "humantime_serde")]
    pub clone_timeout: Duration,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            binary: "git".to_string(),
            clone_timeout: Duration::from_secs(DEFAULT_CLONE_TIMEOUT_SECS),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Git subprocess configuration
    pub git: GitConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if the file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if let Some(path) = config_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| Error::Unexpected {
            status: -1,
            stderr: format!("Failed to parse config: {}", e),
        })
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/gitstream/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gitstream").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - GITSTREAM_GIT_BINARY: Name or path of the git executable
    /// - GITSTREAM_CLONE_TIMEOUT: Clone timeout as a humantime string
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(binary) = std::env::var("GITSTREAM_GIT_BINARY") {
            self.git.binary = binary;
        }

        if let Ok(timeout) = std::env::var("GITSTREAM_CLONE_TIMEOUT") {
            match humantime::parse_duration(&timeout) {
                Ok(d) => self.git.clone_timeout = d,
                Err(e) => {
                    tracing::warn!("ignoring GITSTREAM_CLONE_TIMEOUT {:?}: {}", timeout, e);
                }
            }
        }

        self
    }
}
