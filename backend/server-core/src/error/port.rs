use common::ErrorLocation;

use std::error::Error as StdError;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum PortError {
    /// A specific, non-default port was requested and could not be bound.
    #[error("Port Unavailable Error: {message} {location}")]
    ExplicitPortUnavailable {
        port: i32,
        message: String,
        location: ErrorLocation,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl PortError {
    /// The port the caller asked for.
    pub fn port(&self) -> i32 {
        match self {
            PortError::ExplicitPortUnavailable { port, .. } => *port,
        }
    }
}
