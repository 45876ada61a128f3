pub mod providers;

pub use providers::{
    ConfigProvider, DefaultProvider, EnvProvider, LayeredConfig, PropertiesProvider,
    ResolvedSettings, SettingSource,
};

use crate::connection::ClientDriver;
use crate::error::config::ConfigError;
use crate::server::kind::ServerFamily;
use crate::server::readiness::DEFAULT_STARTUP_TIMEOUT;

use common::ErrorLocation;
use models::{ServerProperties, ServerPropertiesBuilder};

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "embedded-redis.toml";
const CONFIG_DIR_NAME: &str = "embedded-redis";
const CONFIG_VERSION: u32 = 1;

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub kind: ServerFamily,
    pub exec: Option<PathBuf>,
    pub port: Option<i32>,
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            kind: ServerFamily::default(),
            exec: None,
            port: None,
            startup_timeout: default_startup_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub driver: ClientDriver,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub client: ClientConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            server: ServerConfig::default(),
            client: ClientConfig::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_startup_timeout() -> String {
    humantime::format_duration(DEFAULT_STARTUP_TIMEOUT).to_string()
}

/// Platform config directory for the embedded server (`~/.config/embedded-redis` on Linux).
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME))
}

// ============================================
// IMPLEMENTATION
// ============================================

impl AppConfig {
    /// Load config from `{config_dir}/embedded-redis.toml`.
    ///
    /// # Returns
    ///
    /// Returns `Ok(AppConfig)` if loaded successfully or defaults if file missing.
    /// Returns `Err(ConfigError)` if file exists but is corrupted/invalid.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        Self::load_from_path(&config_dir.join(CONFIG_FILE_NAME))
    }

    /// Load config from an explicit file path. A missing file yields defaults.
    pub fn load_from_path(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(config_path).map_err(|e| {
            warn!("Failed to read config file: {}", e);
            ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.to_path_buf(),
                source: e,
            }
        })?;

        let config: AppConfig = toml::from_str(&contents).map_err(|e| {
            warn!("Failed to parse config TOML: {}", e);
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        config.validate()?;

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid version: {} (expected 1-{})",
                    self.version, CONFIG_VERSION
                ),
            });
        }

        if let Some(port) = self.server.port
            && port > i32::from(u16::MAX)
        {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!("Invalid port: {port} (must be at most {})", u16::MAX),
            });
        }

        self.startup_timeout()?;
        self.properties()?;

        Ok(())
    }

    /// `server.startup_timeout` parsed as a humantime duration (`"10s"`, `"1m 30s"`).
    pub fn startup_timeout(&self) -> Result<Duration, ConfigError> {
        let raw = self.server.startup_timeout.trim();

        let timeout = humantime::parse_duration(raw).map_err(|e| ConfigError::ValidationError {
            location: ErrorLocation::from(Location::caller()),
            reason: format!("Invalid startup_timeout '{raw}': {e}"),
        })?;

        if timeout.is_zero() {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: String::from("startup_timeout must be greater than zero"),
            });
        }

        Ok(timeout)
    }

    /// The `[server]` table as validated [`ServerProperties`].
    #[track_caller]
    pub fn properties(&self) -> Result<ServerProperties, ConfigError> {
        let mut builder = ServerPropertiesBuilder::default();

        if let Some(ref exec) = self.server.exec {
            builder = builder.using_executable(exec);
        }
        if let Some(port) = self.server.port {
            builder = builder.using_port(port);
        }

        Ok(builder.build()?)
    }
}
