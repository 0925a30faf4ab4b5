//! Persisted application configuration for the offline store.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::utils::{self, ensure_dir, write_atomic};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Seed the demo fixture when the slot is empty on first load.
    pub seed_demo_data: bool,
    /// Override for the period collection slot path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed_demo_data: true,
            store_path: None,
        }
    }
}

impl Config {
    pub fn store_path(&self) -> PathBuf {
        self.store_path.clone().unwrap_or_else(utils::store_file)
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Self::at_path(utils::config_file())
    }

    pub fn at_path(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }
        Ok(Self { path })
    }

    /// Loads the saved configuration, falling back to defaults when the
    /// file does not exist yet.
    pub fn load(&self) -> Result<Config> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
