use common::ErrorLocation;

use server_core::error::CoreError;
use server_core::error::config::ConfigError;
use server_core::error::server::ServerError;

use std::panic::Location;

use thiserror::Error;

/// Errors surfaced by the embedded-redis binary.
///
/// Library errors are flattened into [`AppError::Core`] with the location of the
/// conversion; the inner location stays in the message.
#[derive(Debug, Error)]
pub enum AppError {
    /// Error from this App (logging, directories)
    #[error("App Error: {message} {location}")]
    App {
        message: String,
        location: ErrorLocation,
    },

    /// Error from server-core operations (config, ports, lifecycle)
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },
}

impl From<CoreError> for AppError {
    #[track_caller]
    fn from(err: CoreError) -> Self {
        AppError::Core {
            message: err.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<ConfigError> for AppError {
    #[track_caller]
    fn from(err: ConfigError) -> Self {
        AppError::from(CoreError::from(err))
    }
}

impl From<ServerError> for AppError {
    #[track_caller]
    fn from(err: ServerError) -> Self {
        AppError::from(CoreError::from(err))
    }
}
