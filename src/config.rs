//! Application configuration
//!
//! Read from `config.toml` in the data directory. Every section is
//! optional:
//! ```toml
//! [scheduler]
//! intervals = [0, 2, 4, 7, 14]
//! demotion = "reset"        # or "step_back"
//!
//! [planner]
//! reconcile = "full_refetch" # or "merge_by_id"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flashcards::LeitnerConfig;
use crate::planner::PlannerConfig;
use crate::storage::{default_data_dir, StoreError};

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Overrides the platform data directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    pub scheduler: LeitnerConfig,
    pub planner: PlannerConfig,
}

impl AppConfig {
    /// Load config from file; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.scheduler.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Load `config.toml` from a data directory
    pub fn load_from_dir(data_dir: &Path) -> Result<Self, ConfigError> {
        Self::load(&data_dir.join(CONFIG_FILE))
    }

    pub fn resolve_data_dir(&self) -> Result<PathBuf, StoreError> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_data_dir(),
        }
    }
}
