//! Layered resolution of the executable and port settings.
//!
//! Providers are consulted in order and the first one with a value wins, separately
//! for each setting. The standard order is:
//! 1. Environment (`EMBEDDED_REDIS_PORT`, `EMBEDDED_REDIS_EXEC`)
//! 2. Typed properties from the config file
//! 3. Compile-time default (the kind's default port, no executable override)

use crate::error::config::ConfigError;

use models::{ServerProperties, ServerPropertiesBuilder};

use std::env;
use std::fmt::{Display, Formatter, Result as FormatResult};
use std::path::PathBuf;

use log::{debug, info, warn};

pub const PORT_ENV_VAR: &str = "EMBEDDED_REDIS_PORT";
pub const EXEC_ENV_VAR: &str = "EMBEDDED_REDIS_EXEC";

/// Which layer a setting came from (for logging).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingSource {
    Environment,
    Properties,
    Default,
}

impl Display for SettingSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        match self {
            SettingSource::Environment => write!(f, "environment"),
            SettingSource::Properties => write!(f, "config file"),
            SettingSource::Default => write!(f, "default"),
        }
    }
}

pub trait ConfigProvider: Send + Sync {
    fn source(&self) -> SettingSource;
    fn port(&self) -> Option<i32>;
    fn exec(&self) -> Option<PathBuf>;
}

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Reads overrides from environment variables.
///
/// A port equal to the default port is not treated as an override, so a client-side
/// "port = 6379" setting does not pin the embedded server to 6379.
pub struct EnvProvider {
    lookup: EnvLookup,
    default_port: u16,
}

impl EnvProvider {
    pub fn new(default_port: u16) -> Self {
        Self::with_lookup(default_port, |key| env::var(key).ok())
    }

    /// Use `lookup` instead of the process environment.
    pub fn with_lookup<F>(default_port: u16, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            lookup: Box::new(lookup),
            default_port,
        }
    }
}

impl ConfigProvider for EnvProvider {
    fn source(&self) -> SettingSource {
        SettingSource::Environment
    }

    fn port(&self) -> Option<i32> {
        let raw = (self.lookup)(PORT_ENV_VAR)?;
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return None;
        }

        match trimmed.parse::<i32>() {
            Ok(port) if port == i32::from(self.default_port) => {
                debug!("{PORT_ENV_VAR}={port} equals the default port, not an override");
                None
            }
            Ok(port) => Some(port),
            Err(e) => {
                warn!("Ignoring {PORT_ENV_VAR}='{trimmed}': {e}");
                None
            }
        }
    }

    fn exec(&self) -> Option<PathBuf> {
        (self.lookup)(EXEC_ENV_VAR)
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from)
    }
}

/// Settings from the typed config file.
pub struct PropertiesProvider {
    properties: ServerProperties,
}

impl PropertiesProvider {
    pub fn new(properties: ServerProperties) -> Self {
        Self { properties }
    }
}

impl ConfigProvider for PropertiesProvider {
    fn source(&self) -> SettingSource {
        SettingSource::Properties
    }

    fn port(&self) -> Option<i32> {
        self.properties.port()
    }

    fn exec(&self) -> Option<PathBuf> {
        self.properties.exec().map(PathBuf::from)
    }
}

/// Last resort: the kind's default port and no executable override.
pub struct DefaultProvider {
    default_port: u16,
}

impl DefaultProvider {
    pub fn new(default_port: u16) -> Self {
        Self { default_port }
    }
}

impl ConfigProvider for DefaultProvider {
    fn source(&self) -> SettingSource {
        SettingSource::Default
    }

    fn port(&self) -> Option<i32> {
        Some(i32::from(self.default_port))
    }

    fn exec(&self) -> Option<PathBuf> {
        None
    }
}

/// Result of [`LayeredConfig::resolve`].
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub properties: ServerProperties,
    pub port_source: Option<SettingSource>,
    pub exec_source: Option<SettingSource>,
}

/// Ordered provider list, first match wins per setting.
#[derive(Default)]
pub struct LayeredConfig {
    providers: Vec<Box<dyn ConfigProvider>>,
}

impl LayeredConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment, then `properties`, then `default_port`.
    pub fn standard(default_port: u16, properties: ServerProperties) -> Self {
        Self::new()
            .with_provider(EnvProvider::new(default_port))
            .with_provider(PropertiesProvider::new(properties))
            .with_provider(DefaultProvider::new(default_port))
    }

    /// Append a provider with lower precedence than those already added.
    pub fn with_provider<P: ConfigProvider + 'static>(mut self, provider: P) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn sources(&self) -> Vec<SettingSource> {
        self.providers.iter().map(|p| p.source()).collect()
    }

    /// Merge all layers into validated properties.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if the winning executable does not exist.
    #[track_caller]
    pub fn resolve(&self) -> Result<ResolvedSettings, ConfigError> {
        let port = self
            .providers
            .iter()
            .find_map(|p| p.port().map(|port| (port, p.source())));

        let exec = self
            .providers
            .iter()
            .find_map(|p| p.exec().map(|exec| (exec, p.source())));

        let mut builder = ServerPropertiesBuilder::default();

        if let Some((port, source)) = port {
            info!("Using port {port} from {source}");
            builder = builder.using_port(port);
        }

        if let Some((ref exec, source)) = exec {
            info!("Using executable {} from {source}", exec.display());
            builder = builder.using_executable(exec);
        }

        Ok(ResolvedSettings {
            properties: builder.build()?,
            port_source: port.map(|(_, source)| source),
            exec_source: exec.map(|(_, source)| source),
        })
    }
}
