use crate::error::model_error::ModelError;
use crate::{ErrorLocation, ServerProperties};

use std::panic::Location;
use std::path::PathBuf;

/// Builder for validated [`ServerProperties`].
///
/// Used both for fresh construction and, through [`ServerProperties::copy`], for deriving
/// a variant of existing properties (typically to pin the port chosen by configuration).
#[derive(Debug, Default)]
pub struct ServerPropertiesBuilder {
    exec: Option<PathBuf>,
    port: Option<i32>,
}

impl From<&ServerProperties> for ServerPropertiesBuilder {
    fn from(properties: &ServerProperties) -> Self {
        Self {
            exec: properties.exec.clone(),
            port: properties.port,
        }
    }
}

impl ServerPropertiesBuilder {
    pub fn using_executable(mut self, exec: impl Into<PathBuf>) -> Self {
        self.exec = Some(exec.into());
        self
    }

    pub fn without_executable(mut self) -> Self {
        self.exec = None;
        self
    }

    pub fn using_port(mut self, port: i32) -> Self {
        self.port = Some(port);
        self
    }

    pub fn without_port(mut self) -> Self {
        self.port = None;
        self
    }

    /// Build the properties, rejecting an executable override that does not exist.
    #[track_caller]
    pub fn build(self) -> Result<ServerProperties, ModelError> {
        if let Some(ref exec) = self.exec {
            if exec.as_os_str().is_empty() {
                return Err(ModelError::Validation {
                    message: String::from("Executable path cannot be empty"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }

            if !exec.is_file() {
                return Err(ModelError::Validation {
                    message: format!("Executable [{}] for server not found", exec.display()),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }

        Ok(ServerProperties {
            exec: self.exec,
            port: self.port,
        })
    }
}
