use crate::error::port::PortError;

use common::ErrorLocation;
use models::ModelError;

use std::error::Error as StdError;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ServerError {
    /// The server process could not be launched or died before becoming ready.
    #[error("Launch Error: {message} {location}")]
    Launch {
        message: String,
        location: ErrorLocation,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// A lifecycle method was called on a handle that was never initialized.
    #[error("Uninitialized Error: {message} {location}")]
    Uninitialized {
        message: String,
        location: ErrorLocation,
    },

    #[error("Already Initialized Error: {message} {location}")]
    AlreadyInitialized {
        message: String,
        location: ErrorLocation,
    },

    #[error("Already Running Error: {message} {location}")]
    AlreadyRunning {
        message: String,
        location: ErrorLocation,
    },

    /// The handle reached its terminal state and cannot be started again.
    #[error("Terminated Error: {message} {location}")]
    Terminated {
        message: String,
        location: ErrorLocation,
    },

    /// The server process could not be terminated cleanly.
    #[error("Stop Error: {message} {location}")]
    Stop {
        message: String,
        location: ErrorLocation,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("Timeout Error: {message} {location}")]
    Timeout {
        message: String,
        location: ErrorLocation,
    },

    #[error("Validation Error: {message} {location}")]
    Validation {
        message: String,
        location: ErrorLocation,
    },

    #[error(transparent)]
    Port(#[from] PortError),
}

impl From<ModelError> for ServerError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Validation { message, location } => {
                ServerError::Validation { message, location }
            }
        }
    }
}
