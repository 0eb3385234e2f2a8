//! Configuration loading and management.
//!
//! Resolution order, lowest to highest priority:
//! 1. Built-in defaults
//! 2. YAML file: `--config`, `$TASK_MANAGER_CONFIG`, `./task-manager.yaml`,
//!    or `<config dir>/nl-task-manager/config.yaml`
//! 3. Environment variables (a `.env` file is loaded first):
//!    - `DATABASE_URL` - SQLite connection string
//!    - `TASK_MANAGER_ERROR_PREFIX` - prefix for failure replies
//! 4. CLI flags (applied by the binary)

use crate::agent::DEFAULT_ERROR_PREFIX;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default connection string, relative to the working directory.
pub const DEFAULT_DATABASE_URL: &str = "sqlite:///task_manager.db";

const PROJECT_CONFIG_FILE: &str = "task-manager.yaml";
const USER_CONFIG_DIR: &str = "nl-task-manager";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub agent: AgentConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection string (`sqlite:///path.db`, `sqlite://:memory:`, or a path).
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}

/// Agent reply configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Prefix for replies when a request fails.
    #[serde(default = "default_error_prefix")]
    pub error_prefix: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            error_prefix: default_error_prefix(),
        }
    }
}

fn default_error_prefix() -> String {
    DEFAULT_ERROR_PREFIX.to_string()
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    /// Find the config file to use, if any.
    ///
    /// An explicit path is returned even if it does not exist, so loading it
    /// reports the error; discovered paths are only returned when present.
    pub fn discover_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Ok(path) = std::env::var("TASK_MANAGER_CONFIG") {
            return Some(PathBuf::from(path));
        }

        let project = PathBuf::from(PROJECT_CONFIG_FILE);
        if project.is_file() {
            return Some(project);
        }

        dirs::config_dir()
            .map(|dir| dir.join(USER_CONFIG_DIR).join("config.yaml"))
            .filter(|path| path.is_file())
    }

    /// Defaults, then the config file, then the process environment.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match Self::discover_path(explicit) {
            Some(path) => {
                debug!(path = %path.display(), "Loading config file");
                Self::load(path)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override fields from environment-style lookups.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()) {
            self.database.url = url;
        }
        if let Some(prefix) = lookup("TASK_MANAGER_ERROR_PREFIX").filter(|v| !v.trim().is_empty()) {
            self.agent.error_prefix = prefix;
        }
    }
}

/// Load a `.env` file from the working directory or its parents, if present.
pub fn load_env_file() {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Failed to load .env file"),
    }
}
