use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

pub const IN_MEMORY: &str = ":memory:";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Directory holding the database files, or `:memory:`.
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_db_name")]
    pub db_name: String,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

fn default_database_url() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("content-organizer")
        .to_string_lossy()
        .to_string()
}

fn default_db_name() -> String {
    "content_organizer".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:8001".to_string()
}

fn default_fetch_timeout() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            db_name: default_db_name(),
            bind_addr: default_bind_addr(),
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

impl Config {
    /// Loads the config file at the default location, writing defaults on first run.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            if let Err(e) = config.save_to(config_path) {
                tracing::warn!("Could not write default config to {:?}: {}", config_path, e);
            }
            Ok(config)
        }
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    /// Applies `DATABASE_URL`, `DB_NAME`, `BIND_ADDR` and `FETCH_TIMEOUT_SECS` overrides.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database_url = url;
        }
        if let Some(name) = lookup("DB_NAME") {
            self.db_name = name;
        }
        if let Some(addr) = lookup("BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(secs) = lookup("FETCH_TIMEOUT_SECS") {
            self.fetch_timeout_secs = secs.parse().map_err(|_| {
                AppError::Config(format!("FETCH_TIMEOUT_SECS must be a number, got {:?}", secs))
            })?;
        }
        if self.db_name.trim().is_empty() {
            return Err(AppError::Config("db_name must not be empty".to_string()));
        }
        Ok(self)
    }

    /// Resolves the SQLite location for this database name.
    pub fn database_path(&self) -> String {
        if self.database_url == IN_MEMORY {
            return IN_MEMORY.to_string();
        }
        PathBuf::from(&self.database_url)
            .join(format!("{}.db", self.db_name))
            .to_string_lossy()
            .to_string()
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("content-organizer")
            .join("config.toml")
    }
}
