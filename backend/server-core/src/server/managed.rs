use crate::EMBEDDED_SERVER_HOST;
use crate::error::server::ServerError;
use crate::port::{PortResolver, ResolvedPort};
use crate::server::engine::EmbeddedServer;
use crate::server::executable::locate_executable;
use crate::server::kind::ServerKind;
use crate::server::readiness::{DEFAULT_STARTUP_TIMEOUT, Readiness};

use common::ErrorLocation;
use models::{ServerEndpoint, ServerEndpointBuilder, ServerProperties};

use std::panic::Location;
use std::path::Path;
use std::time::Duration;

use log::{debug, error, info, warn};

/// Where a [`ManagedServerProcess`] is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// No engine has been built.
    Uninitialized,
    /// Engine built, never started.
    Created,
    Starting,
    Running,
    Stopping,
    /// Terminal. Reached by stopping a running server or by a failed start.
    Stopped,
}

/// Lifecycle handle owning exactly one embedded server engine.
///
/// Lifecycle methods take `&mut self`; callers sharing a handle across tasks must
/// synchronize externally.
#[derive(Debug)]
pub struct ManagedServerProcess<K: ServerKind> {
    kind: K,
    engine: Option<EmbeddedServer>,
    port: Option<ResolvedPort>,
    state: ServerState,
    readiness: Option<Readiness>,
    startup_timeout: Duration,
}

impl<K: ServerKind> ManagedServerProcess<K> {
    /// An uninitialized handle. Every lifecycle call except `stop` fails until
    /// [`initialize`](Self::initialize) succeeds.
    pub fn new(kind: K) -> Self {
        Self {
            kind,
            engine: None,
            port: None,
            state: ServerState::Uninitialized,
            readiness: None,
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
        }
    }

    /// Build a handle whose engine will run `exec_override` (or the kind's binary) on `port`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Launch`] if the executable cannot be located.
    #[track_caller]
    pub fn build(
        kind: K,
        exec_override: Option<&Path>,
        port: ResolvedPort,
    ) -> Result<Self, ServerError> {
        let mut handle = Self::new(kind);
        handle.initialize(exec_override, port)?;
        Ok(handle)
    }

    /// Resolve the configured port for this kind, then [`build`](Self::build).
    ///
    /// # Errors
    ///
    /// - [`ServerError::Port`] if an explicit port is unavailable
    /// - [`ServerError::Launch`] if the executable cannot be located
    #[track_caller]
    pub fn from_properties(kind: K, properties: &ServerProperties) -> Result<Self, ServerError> {
        let requested = properties.port_or_default(kind.default_port());
        let port = PortResolver::for_kind(&kind).resolve(requested)?;
        Self::build(kind, properties.exec(), port)
    }

    /// Build the engine. Allowed once per handle.
    #[track_caller]
    pub fn initialize(
        &mut self,
        exec_override: Option<&Path>,
        port: ResolvedPort,
    ) -> Result<(), ServerError> {
        if self.engine.is_some() {
            return Err(ServerError::AlreadyInitialized {
                message: format!("{} server handle is already initialized", self.kind.name()),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let executable = locate_executable(self.kind.binary(), exec_override).inspect_err(|e| {
            error!("Failed to initialize {} server: {e}", self.kind.name());
        })?;

        let args = self.kind.launch_args(EMBEDDED_SERVER_HOST, port.port());

        info!(
            "Initialized {} server: {} on port {}",
            self.kind.name(),
            executable.display(),
            port
        );

        self.engine = Some(EmbeddedServer::new(
            executable,
            EMBEDDED_SERVER_HOST,
            port.port(),
            args,
        ));
        self.port = Some(port);
        self.state = ServerState::Created;
        Ok(())
    }

    /// Replace the kind's log-pattern readiness check.
    pub fn with_readiness(mut self, readiness: Readiness) -> Self {
        self.readiness = Some(readiness);
        self
    }

    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    pub fn kind(&self) -> &K {
        &self.kind
    }

    pub fn default_port(&self) -> u16 {
        self.kind.default_port()
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub fn port(&self) -> Option<u16> {
        self.port.map(|p| p.port())
    }

    pub fn resolved_port(&self) -> Option<ResolvedPort> {
        self.port
    }

    pub fn startup_timeout(&self) -> Duration {
        self.startup_timeout
    }

    /// The underlying engine.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Uninitialized`] if no engine was built.
    #[track_caller]
    pub fn engine(&self) -> Result<&EmbeddedServer, ServerError> {
        self.engine.as_ref().ok_or_else(|| ServerError::Uninitialized {
            message: format!("{} server not initialized", self.kind.name()),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Loopback endpoint clients should connect to.
    #[track_caller]
    pub fn endpoint(&self) -> Result<ServerEndpoint, ServerError> {
        let engine = self.engine()?;

        Ok(ServerEndpointBuilder::default()
            .with_host(engine.host())
            .with_port(engine.port())
            .build()?)
    }

    pub fn is_running(&self) -> bool {
        self.engine.as_ref().is_some_and(EmbeddedServer::is_active)
    }

    /// Start the server and wait for it to become ready.
    ///
    /// # Errors
    ///
    /// - [`ServerError::Uninitialized`] if the handle has no engine
    /// - [`ServerError::Terminated`] if the handle was already stopped
    /// - [`ServerError::Launch`] / [`ServerError::Timeout`] from the engine; the handle is
    ///   then `Stopped`
    /// - [`ServerError::AlreadyRunning`] if the engine is already running; state is unchanged
    pub async fn start(&mut self) -> Result<(), ServerError> {
        let name = self.kind.name().to_string();

        let Some(engine) = self.engine.as_mut() else {
            return Err(ServerError::Uninitialized {
                message: format!("{name} server not initialized"),
                location: ErrorLocation::from(Location::caller()),
            });
        };

        let readiness = match self.readiness {
            Some(ref readiness) => readiness.clone(),
            None => Readiness::for_kind(&self.kind)?,
        };

        if self.state == ServerState::Stopped {
            return Err(ServerError::Terminated {
                message: format!("{name} server was stopped and cannot be restarted"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let previous = self.state;
        self.state = ServerState::Starting;
        info!(
            "Starting {name} server on port {}: {} {}",
            engine.port(),
            engine.executable().display(),
            engine.args().join(" ")
        );

        match engine.start(&readiness, self.startup_timeout).await {
            Ok(()) => {
                self.state = ServerState::Running;
                info!(
                    "{name} server running on {}:{} (PID: {:?})",
                    engine.host(),
                    engine.port(),
                    engine.pid()
                );
                Ok(())
            }
            Err(e @ ServerError::AlreadyRunning { .. }) => {
                self.state = previous;
                Err(e)
            }
            Err(e) => {
                self.state = ServerState::Stopped;
                error!("Failed to start {name} server: {e}");
                Err(e)
            }
        }
    }

    /// Stop the server. Never fails; shutdown problems are logged.
    pub async fn stop(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            debug!("Stop requested on uninitialized {} server", self.kind.name());
            return;
        };

        if !matches!(self.state, ServerState::Starting | ServerState::Running) {
            debug!(
                "Stop requested on {} server in state {:?}; nothing to do",
                self.kind.name(),
                self.state
            );
            return;
        }

        self.state = ServerState::Stopping;
        info!("Stopping {} server on port {}", self.kind.name(), engine.port());

        if let Err(e) = engine.stop().await {
            warn!("Error while stopping {} server: {e}", self.kind.name());
        }

        self.state = ServerState::Stopped;
    }
}
