use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::devices::types::DeviceKind;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SaltyConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub devices: DeviceConfig,
    pub executor: ExecutorConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub transport: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub routines_dir: String,
    pub history_limit: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DeviceConfig {
    pub cache_duration_secs: u64,
    pub max_stale_secs: u64,
    #[serde(rename = "virtual")]
    pub virtual_devices: Vec<VirtualDeviceConfig>,
}

/// A device served by the in-memory backend.
#[derive(Debug, Deserialize, Clone)]
pub struct VirtualDeviceConfig {
    pub alias: String,
    pub host: String,
    #[serde(default = "default_kind")]
    pub kind: DeviceKind,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ExecutorConfig {
    pub max_wait_secs: u64,
    pub dry_run: bool,
}

fn default_kind() -> DeviceKind {
    DeviceKind::Bulb
}

impl Default for SaltyConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            devices: DeviceConfig::default(),
            executor: ExecutorConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".into(),
            host: "127.0.0.1".into(),
            port: 8765,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let routines_dir = default_salty_dir()
            .join("routines")
            .to_string_lossy()
            .into_owned();
        Self {
            routines_dir,
            history_limit: crate::routine::storage::DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            cache_duration_secs: 30,
            max_stale_secs: 300,
            virtual_devices: Vec::new(),
        }
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_wait_secs: 300,
            dry_run: false,
        }
    }
}

/// Returns `~/.salty/`, or `./.salty` when no home directory is known.
pub fn default_salty_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".salty")
}

/// Returns the default config file path: `~/.salty/config.toml`
pub fn default_config_path() -> PathBuf {
    default_salty_dir().join("config.toml")
}

impl SaltyConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            SaltyConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SALTY_ROUTINES_DIR") {
            self.storage.routines_dir = val;
        }
        if let Ok(val) = std::env::var("SALTY_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("SALTY_TRANSPORT") {
            self.server.transport = val;
        }
        if let Ok(val) = std::env::var("SALTY_DEVICE_CACHE_SECS") {
            match val.parse() {
                Ok(secs) => self.devices.cache_duration_secs = secs,
                Err(_) => tracing::warn!(value = %val, "ignoring invalid SALTY_DEVICE_CACHE_SECS"),
            }
        }
        if let Ok(val) = std::env::var("SALTY_DRY_RUN") {
            self.executor.dry_run = matches!(val.as_str(), "1" | "true" | "yes");
        }
    }

    /// Resolve the routines directory, expanding `~` if needed.
    pub fn resolved_routines_dir(&self) -> PathBuf {
        expand_tilde(&self.storage.routines_dir)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
