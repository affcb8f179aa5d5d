use crate::error::{NaglModelsError, Result};
use crate::models::catalog::RELEASES_URL;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Config {
    /// Override for the artifact cache directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Release feed the catalog tier queries
    #[serde(default = "default_releases_url")]
    pub releases_url: String,

    /// Extra directories searched for installed model files
    #[serde(default)]
    pub model_paths: Vec<PathBuf>,
}

fn default_releases_url() -> String {
    RELEASES_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: None,
            releases_url: default_releases_url(),
            model_paths: Vec::new(),
        }
    }
}

impl Config {
    /// Load config from disk, falling back to defaults when the file is absent
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;

        toml::from_str(&content).map_err(|e| {
            NaglModelsError::Config(format!("Failed to parse {}: {e}", path.display()))
        })
    }

    /// Config file location
    pub fn path() -> Result<PathBuf> {
        let base = if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg_config)
        } else {
            let home = env::var("HOME")
                .map_err(|_| NaglModelsError::Config("HOME env var not set".to_string()))?;
            PathBuf::from(home).join(".config")
        };

        Ok(base.join("nagl-models").join("config.toml"))
    }
}
