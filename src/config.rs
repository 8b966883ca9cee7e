use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::handler::CONFIRMATION_WINDOW;
use crate::utils::paths::get_config_path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,

    /// How long the confirmation label stays up, in milliseconds.
    #[serde(default = "default_confirm_ms")]
    pub confirm_ms: u64,
}

fn default_theme() -> String {
    "default".to_string()
}

fn default_confirm_ms() -> u64 {
    CONFIRMATION_WINDOW.as_millis() as u64
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            confirm_ms: default_confirm_ms(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        Ok(config)
    }

    pub fn confirm_delay(&self) -> Duration {
        Duration::from_millis(self.confirm_ms)
    }
}
