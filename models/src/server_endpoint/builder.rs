use crate::error::model_error::ModelError;
use crate::{ErrorLocation, ServerEndpoint};

use std::panic::Location;

/// Builder for creating validated ServerEndpoint instances.
#[derive(Debug, Default)]
pub struct ServerEndpointBuilder {
    host: Option<String>,
    port: Option<u16>,
}

impl ServerEndpointBuilder {
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Build the ServerEndpoint with validation.
    #[track_caller]
    pub fn build(self) -> Result<ServerEndpoint, ModelError> {
        let host = self.host.ok_or_else(|| ModelError::Validation {
            message: String::from("Host is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if host.trim().is_empty() {
            return Err(ModelError::Validation {
                message: String::from("Host cannot be empty"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let port = self.port.ok_or_else(|| ModelError::Validation {
            message: String::from("Port is required"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if port == 0 {
            return Err(ModelError::Validation {
                message: String::from("Port must be non-zero"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(ServerEndpoint { host, port })
    }
}
