use embedded_redis::error::AppError;
use embedded_redis::logger::initialize as LoggerInitialize;
use embedded_redis::runner::{CONFIG_ENV_VAR, ensure_dir, load_config, log_dir, run};

use std::env::var_os;
use std::path::PathBuf;

use log::{info, warn};
use tokio::signal::ctrl_c;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Before anything reads the environment
    let dotenv = dotenvy::dotenv();

    let log_dir = log_dir();
    ensure_dir(&log_dir)?;
    LoggerInitialize(&log_dir)?;

    info!("embedded-redis starting");
    info!("Log directory: {}", log_dir.display());

    match dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Failed to load .env file: {e}"),
    }

    let config_path = var_os(CONFIG_ENV_VAR).map(PathBuf::from);
    let config = load_config(config_path.as_deref())?;

    run(&config, async {
        if let Err(e) = ctrl_c().await {
            warn!("Failed to listen for Ctrl-C, shutting down: {e}");
        }
    })
    .await
}
