//! Wiring from configuration to a running embedded server.

use crate::error::AppError;

use common::ErrorLocation;

use server_core::config::{AppConfig, LayeredConfig, default_config_dir};
use server_core::connection::ConnectionFactory;
use server_core::server::lifecycle::run_until;
use server_core::{ManagedServerProcess, ServerFamily, ServerKind};

use std::env::{temp_dir, var_os};
use std::future::Future;
use std::panic::Location;
use std::path::{Path, PathBuf};

use log::info;

/// Explicit config file path, bypassing the platform config directory.
pub const CONFIG_ENV_VAR: &str = "EMBEDDED_REDIS_CONFIG";
/// Directory for `embedded-redis.log`.
pub const LOG_DIR_ENV_VAR: &str = "EMBEDDED_REDIS_LOG_DIR";

const APP_DIR_NAME: &str = "embedded-redis";

/// `$EMBEDDED_REDIS_LOG_DIR`, else `{data_local_dir}/embedded-redis/logs`, else the temp dir.
pub fn log_dir() -> PathBuf {
    if let Some(dir) = var_os(LOG_DIR_ENV_VAR) {
        return PathBuf::from(dir);
    }

    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join("logs"))
        .unwrap_or_else(|| temp_dir().join(APP_DIR_NAME))
}

/// Load the config file from `path`, or from the platform config directory.
///
/// Without either, defaults are used.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, AppError> {
    if let Some(path) = path {
        return Ok(AppConfig::load_from_path(path)?);
    }

    match default_config_dir() {
        Some(dir) => Ok(AppConfig::load(&dir)?),
        None => {
            info!("No platform config directory, using defaults");
            Ok(AppConfig::default())
        }
    }
}

/// Build the server handle described by `config`, with environment overrides applied.
///
/// The returned handle is initialized but not started.
#[track_caller]
pub fn prepare(config: &AppConfig) -> Result<ManagedServerProcess<ServerFamily>, AppError> {
    let kind = config.server.kind;
    let startup_timeout = config.startup_timeout()?;

    let resolved = LayeredConfig::standard(kind.default_port(), config.properties()?).resolve()?;

    let handle = ManagedServerProcess::from_properties(kind, &resolved.properties)?
        .with_startup_timeout(startup_timeout);

    Ok(handle)
}

/// Start the configured server, serve until `shutdown` completes, then stop it.
pub async fn run<F>(config: &AppConfig, shutdown: F) -> Result<(), AppError>
where
    F: Future<Output = ()>,
{
    let mut handle = prepare(config)?;

    let factory = ConnectionFactory::for_server(&handle, config.client.driver)?;
    if let Some(port) = handle.resolved_port() {
        info!("Resolved port {port}");
    }

    info!(
        "Embedded {} server will listen on {} ({:?} clients, startup timeout {})",
        handle.kind().name(),
        factory.url(),
        factory.driver(),
        humantime::format_duration(handle.startup_timeout())
    );

    run_until(&mut handle, shutdown).await?;

    info!("Embedded {} server stopped", handle.kind().name());
    Ok(())
}

/// Create `dir` if needed.
#[track_caller]
pub fn ensure_dir(dir: &Path) -> Result<(), AppError> {
    std::fs::create_dir_all(dir).map_err(|e| AppError::App {
        message: format!("Failed to create directory {}: {e}", dir.display()),
        location: ErrorLocation::from(Location::caller()),
    })
}
