//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the remote backend connection, the last signed-in email,
//! and an optional data directory override.
//!
//! Configuration is stored at `~/.config/proteinpulse/config.json`.
//! `PROTEIN_PULSE_URL`, `PROTEIN_PULSE_ANON_KEY` and `PROTEIN_PULSE_DATA_DIR`
//! override the file when set. Overrides only live for the process and are
//! never written back by `save`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "proteinpulse";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const ENV_URL: &str = "PROTEIN_PULSE_URL";
const ENV_ANON_KEY: &str = "PROTEIN_PULSE_ANON_KEY";
const ENV_DATA_DIR: &str = "PROTEIN_PULSE_DATA_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub url: String,
    pub anon_key: String,
}

/// Values taken from the environment for this run
#[derive(Debug, Clone, Default)]
struct EnvOverrides {
    url: Option<String>,
    anon_key: Option<String>,
    data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Remote backend as stored in the config file
    pub remote: Option<RemoteConfig>,
    pub last_email: Option<String>,
    pub data_dir: Option<PathBuf>,
    #[serde(skip)]
    overrides: EnvOverrides,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?, |key| std::env::var(key).ok())
    }

    /// Save the file-sourced settings; environment overrides are left out
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    fn load_from(path: &Path, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")?
        } else {
            Self::default()
        };
        Ok(config.with_overrides(lookup))
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Record environment overrides. `lookup` is `std::env::var` outside tests.
    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        self.overrides = EnvOverrides {
            url: non_empty(ENV_URL),
            anon_key: non_empty(ENV_ANON_KEY),
            data_dir: non_empty(ENV_DATA_DIR).map(PathBuf::from),
        };
        self
    }

    /// The remote backend in effect, if one is fully configured.
    /// Each field comes from the environment when set, else from the file.
    pub fn remote(&self) -> Option<RemoteConfig> {
        let file = self.remote.as_ref();
        let url = self
            .overrides
            .url
            .clone()
            .or_else(|| file.map(|r| r.url.clone()))?;
        let anon_key = self
            .overrides
            .anon_key
            .clone()
            .or_else(|| file.map(|r| r.anon_key.clone()))?;
        if url.trim().is_empty() || anon_key.trim().is_empty() {
            return None;
        }
        Some(RemoteConfig { url, anon_key })
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = self.overrides.data_dir.as_ref().or(self.data_dir.as_ref()) {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}
