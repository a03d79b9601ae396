use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};

use crate::transport::http::DEFAULT_ENDPOINT;
use crate::view::Language;

pub const ENDPOINT_ENV: &str = "JURIDIQUE_ENDPOINT";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub endpoint: Option<String>,
    pub language: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    /// Environment first, then the config file, then the local default
    pub fn endpoint(&self) -> String {
        std::env::var(ENDPOINT_ENV)
            .ok()
            .filter(|e| !e.trim().is_empty())
            .or_else(|| self.endpoint.clone())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
    }

    pub fn language(&self) -> Language {
        self.language
            .as_deref()
            .and_then(Language::from_str)
            .unwrap_or_default()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS).max(1))
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("juridique"))
    }

    fn get_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }
}
