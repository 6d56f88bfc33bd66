use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use utils::assets::asset_dir;

pub const CONFIG_VERSION: &str = "v1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4100,
        }
    }
}

/// Locations of the two SQLite files. `None` means "next to the config file".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub write_db_path: Option<PathBuf>,
    pub read_db_path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn write_db_path(&self) -> PathBuf {
        self.write_db_path
            .clone()
            .unwrap_or_else(|| asset_dir().join("garden.sqlite"))
    }

    pub fn read_db_path(&self) -> PathBuf {
        self.read_db_path
            .clone()
            .unwrap_or_else(|| asset_dir().join("garden-views.sqlite"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub event_bus_capacity: usize,
    pub rebuild_on_startup: bool,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            event_bus_capacity: 1024,
            rebuild_on_startup: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub config_version: String,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub projection: ProjectionConfig,
    pub pagination: PaginationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: CONFIG_VERSION.to_string(),
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            projection: ProjectionConfig::default(),
            pagination: PaginationConfig::default(),
        }
    }
}

impl Config {
    /// Apply overrides from a variable lookup (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!(value = %port, "Ignoring invalid PORT override"),
            }
        }
        if let Some(path) = lookup("GARDEN_WRITE_DB") {
            self.storage.write_db_path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("GARDEN_READ_DB") {
            self.storage.read_db_path = Some(PathBuf::from(path));
        }
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok().filter(|v| !v.is_empty()));
    }
}

/// Load the config, falling back to defaults when the file is missing or
/// unreadable. The effective config is written back so the file always exists.
pub async fn load_config_from_file(config_path: &Path) -> Config {
    let config = match tokio::fs::read_to_string(config_path).await {
        Ok(raw) => match serde_json::from_str::<Config>(&raw) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %config_path.display(), error = %e, "Invalid config file, using defaults");
                Config::default()
            }
        },
        Err(_) => {
            info!(path = %config_path.display(), "No config file found, creating one with defaults");
            Config::default()
        }
    };

    if let Err(e) = save_config_to_file(&config, config_path).await {
        warn!(path = %config_path.display(), error = %e, "Failed to write config file");
    }

    config
}

pub async fn save_config_to_file(config: &Config, config_path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = config_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let raw = serde_json::to_string_pretty(config)?;
    tokio::fs::write(config_path, raw).await?;
    Ok(())
}
