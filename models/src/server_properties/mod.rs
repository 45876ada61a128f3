pub mod builder;

use builder::ServerPropertiesBuilder;

use std::path::{Path, PathBuf};

/// Launch settings for an embedded server: which binary to run and which port to ask for.
///
/// Instances only come out of [`ServerPropertiesBuilder::build`], which guarantees that
/// `exec`, when present, names an existing regular file.
///
/// The port is kept signed on purpose. Zero and negative values are a legitimate way of
/// saying "no preference" and are interpreted by the port resolver, not rejected here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerProperties {
    pub(crate) exec: Option<PathBuf>,
    pub(crate) port: Option<i32>,
}

impl ServerProperties {
    /// Start a builder pre-populated with the values of `properties`.
    pub fn copy(properties: &ServerProperties) -> ServerPropertiesBuilder {
        ServerPropertiesBuilder::from(properties)
    }

    pub fn exec(&self) -> Option<&Path> {
        self.exec.as_deref()
    }

    pub fn port(&self) -> Option<i32> {
        self.port
    }

    pub fn port_or_default(&self, default_port: u16) -> i32 {
        self.port.unwrap_or(i32::from(default_port))
    }
}
