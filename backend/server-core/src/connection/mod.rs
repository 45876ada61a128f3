//! Connections to a running embedded server.
//!
//! This is deliberately thin: it turns a host and port into TCP streams and leaves the
//! wire protocol to whichever client library sits on top. How streams are handed out is
//! chosen per factory through [`ClientDriver`].

use crate::error::CoreError;
use crate::error::connection::ConnectionError;
use crate::server::engine::EmbeddedServer;
use crate::server::kind::ServerKind;
use crate::server::managed::ManagedServerProcess;
use crate::{DEFAULT_REDIS_PORT, EMBEDDED_SERVER_HOST, REDIS_URL_SCHEME};

use common::ErrorLocation;
use models::{ServerEndpoint, ServerEndpointBuilder};

use std::panic::Location;
use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// How a [`ConnectionFactory`] hands out connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientDriver {
    /// One lazily opened stream shared by every caller.
    #[default]
    Multiplexed,
    /// A fresh stream per call.
    Dedicated,
}

/// A protocol-level connection produced by a [`ConnectionFactory`].
#[derive(Debug)]
pub enum Connection {
    Dedicated(TcpStream),
    Shared(Arc<Mutex<TcpStream>>),
}

pub struct ConnectionFactory {
    endpoint: ServerEndpoint,
    driver: ClientDriver,
    shared: Mutex<Option<Arc<Mutex<TcpStream>>>>,
}

impl ConnectionFactory {
    pub fn new(endpoint: ServerEndpoint, driver: ClientDriver) -> Self {
        Self {
            endpoint,
            driver,
            shared: Mutex::new(None),
        }
    }

    /// Factory for `engine`, reached on the loopback interface.
    ///
    /// Uses the engine's first port, or [`DEFAULT_REDIS_PORT`] if it reports none.
    #[track_caller]
    pub fn from_engine(
        engine: &EmbeddedServer,
        driver: ClientDriver,
    ) -> Result<Self, ConnectionError> {
        let port = engine
            .ports()
            .first()
            .copied()
            .unwrap_or(DEFAULT_REDIS_PORT);

        let endpoint = ServerEndpointBuilder::default()
            .with_host(EMBEDDED_SERVER_HOST)
            .with_port(port)
            .build()?;

        Ok(Self::new(endpoint, driver))
    }

    /// Factory for the engine owned by `handle`.
    ///
    /// # Errors
    ///
    /// Fails if `handle` was never initialized.
    #[track_caller]
    pub fn for_server<K: ServerKind>(
        handle: &ManagedServerProcess<K>,
        driver: ClientDriver,
    ) -> Result<Self, CoreError> {
        let engine = handle.engine()?;
        Ok(Self::from_engine(engine, driver)?)
    }

    pub fn endpoint(&self) -> &ServerEndpoint {
        &self.endpoint
    }

    pub fn driver(&self) -> ClientDriver {
        self.driver
    }

    /// `redis://host:port`
    pub fn url(&self) -> String {
        format!("{REDIS_URL_SCHEME}{}", self.endpoint)
    }

    /// Get a connection according to the factory's driver.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Connect`] if the server cannot be reached.
    pub async fn connection(&self) -> Result<Connection, ConnectionError> {
        match self.driver {
            ClientDriver::Dedicated => Ok(Connection::Dedicated(self.connect().await?)),
            ClientDriver::Multiplexed => {
                let mut shared = self.shared.lock().await;

                if let Some(ref stream) = *shared {
                    return Ok(Connection::Shared(Arc::clone(stream)));
                }

                let stream = Arc::new(Mutex::new(self.connect().await?));
                *shared = Some(Arc::clone(&stream));
                info!("Opened shared connection to {}", self.endpoint);
                Ok(Connection::Shared(stream))
            }
        }
    }

    async fn connect(&self) -> Result<TcpStream, ConnectionError> {
        let address = self.endpoint.address();
        debug!("Connecting to {address}");

        TcpStream::connect(&address)
            .await
            .map_err(|e| ConnectionError::Connect {
                message: format!("Failed to connect to {address}: {e}"),
                location: ErrorLocation::from(Location::caller()),
                source: e,
            })
    }
}
