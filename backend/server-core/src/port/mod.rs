//! TCP port resolution for embedded servers.
//!
//! A port request is classified before anything is bound:
//!
//! - **Custom** (positive and different from the server's default port): the caller
//!   demanded this exact port. It is probed and, if it cannot be bound, resolution fails.
//! - **Default / Unspecified** (equal to the default port, zero or negative): the caller
//!   has no real preference. The OS is asked for an ephemeral port; if even that fails the
//!   default port is returned with a warning.
//!
//! Probing opens a transient socket with `SO_REUSEADDR`, binds it, reads back the bound
//! port and closes it again. The result is only a snapshot: another process may grab the
//! port before the server binds it, which then surfaces as a launch failure.

use crate::error::port::PortError;
use crate::server::kind::ServerKind;
use crate::EPHEMERAL_PORT;

use common::ErrorLocation;

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::io::{Error as IoError, ErrorKind, Result as IoResult};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::panic::Location;

use log::{debug, info, warn};
use tokio::net::TcpSocket;

/// How a raw requested port is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortRequest {
    /// Zero or negative.
    Unspecified,
    /// Equal to the server kind's conventional port.
    Default,
    /// Any other positive value, including values that do not fit a TCP port.
    Custom(i32),
}

impl PortRequest {
    pub fn classify(requested: i32, default_port: u16) -> Self {
        if requested <= 0 {
            PortRequest::Unspecified
        } else if requested == i32::from(default_port) {
            PortRequest::Default
        } else {
            PortRequest::Custom(requested)
        }
    }
}

/// Where a resolved port came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortOrigin {
    /// The explicitly requested port, verified bindable.
    Explicit,
    /// Assigned by the OS on bind-to-zero.
    Ephemeral,
    /// No ephemeral port could be obtained; the default port is used unverified.
    DefaultFallback,
}

/// A positive port produced by [`PortResolver`].
///
/// There is no public constructor, so holding one means resolution happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPort {
    port: u16,
    origin: PortOrigin,
}

impl ResolvedPort {
    pub(crate) fn new(port: u16, origin: PortOrigin) -> Self {
        Self { port, origin }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn origin(&self) -> PortOrigin {
        self.origin
    }
}

impl Display for ResolvedPort {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(formatter, "{} ({:?})", self.port, self.origin)
    }
}

/// Resolves port requests against a server kind's default port.
#[derive(Debug, Clone, Copy)]
pub struct PortResolver {
    host: IpAddr,
    default_port: u16,
}

impl PortResolver {
    /// Resolver probing on the loopback interface ([`crate::EMBEDDED_SERVER_HOST`]).
    pub fn new(default_port: u16) -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            default_port,
        }
    }

    pub fn for_kind<K: ServerKind + ?Sized>(kind: &K) -> Self {
        Self::new(kind.default_port())
    }

    pub fn default_port(&self) -> u16 {
        self.default_port
    }

    /// Resolve `requested` to a concrete port.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::ExplicitPortUnavailable`] when a custom port was requested and
    /// it cannot be bound. Default and unspecified requests never fail.
    #[track_caller]
    pub fn resolve(&self, requested: i32) -> Result<ResolvedPort, PortError> {
        self.resolve_with(requested, probe_port)
    }

    /// `true` if `port` can be bound on this resolver's host right now.
    pub fn is_available(&self, port: u16) -> bool {
        probe_port(SocketAddr::new(self.host, port)).is_ok()
    }

    #[track_caller]
    pub(crate) fn resolve_with<F>(&self, requested: i32, probe: F) -> Result<ResolvedPort, PortError>
    where
        F: Fn(SocketAddr) -> IoResult<u16>,
    {
        match PortRequest::classify(requested, self.default_port) {
            PortRequest::Custom(port) => self.assert_available(port, probe),
            PortRequest::Default | PortRequest::Unspecified => {
                debug!(
                    "Port request {requested} carries no explicit preference (default {}); using an ephemeral port",
                    self.default_port
                );
                Ok(self.ephemeral_or_default(probe))
            }
        }
    }

    #[track_caller]
    fn assert_available<F>(&self, port: i32, probe: F) -> Result<ResolvedPort, PortError>
    where
        F: Fn(SocketAddr) -> IoResult<u16>,
    {
        let unavailable = |source: IoError| PortError::ExplicitPortUnavailable {
            port,
            message: format!("Port [{port}] is not available on {}: {source}", self.host),
            location: ErrorLocation::from(Location::caller()),
            source: Box::new(source),
        };

        let tcp_port = u16::try_from(port).map_err(|_| {
            unavailable(IoError::new(
                ErrorKind::InvalidInput,
                format!("{port} is outside the TCP port range"),
            ))
        })?;

        let bound = probe(SocketAddr::new(self.host, tcp_port)).map_err(unavailable)?;

        info!("Using requested port {bound}");
        Ok(ResolvedPort::new(bound, PortOrigin::Explicit))
    }

    fn ephemeral_or_default<F>(&self, probe: F) -> ResolvedPort
    where
        F: Fn(SocketAddr) -> IoResult<u16>,
    {
        match probe(SocketAddr::new(self.host, EPHEMERAL_PORT)) {
            Ok(port) if port != EPHEMERAL_PORT => {
                info!("OS assigned ephemeral port {port}");
                ResolvedPort::new(port, PortOrigin::Ephemeral)
            }
            Ok(_) => {
                warn!(
                    "Ephemeral port probe returned port 0; defaulting to [{}]",
                    self.default_port
                );
                ResolvedPort::new(self.default_port, PortOrigin::DefaultFallback)
            }
            Err(e) => {
                warn!(
                    "Ephemeral port not available; defaulting to [{}]",
                    self.default_port
                );
                debug!("I/O error: {e}");
                ResolvedPort::new(self.default_port, PortOrigin::DefaultFallback)
            }
        }
    }
}

/// Resolve `requested` using a resolver for `default_port` on [`crate::EMBEDDED_SERVER_HOST`].
#[track_caller]
pub fn resolve(requested: i32, default_port: u16) -> Result<ResolvedPort, PortError> {
    PortResolver::new(default_port).resolve(requested)
}

/// Bind a transient socket on `addr` and report the port it ended up on.
///
/// The socket is closed before returning.
pub(crate) fn probe_port(addr: SocketAddr) -> IoResult<u16> {
    let socket = match addr {
        SocketAddr::V4(_) => TcpSocket::new_v4()?,
        SocketAddr::V6(_) => TcpSocket::new_v6()?,
    };

    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;

    let port = socket.local_addr()?.port();
    debug!("Probe bound {} (requested {addr})", port);

    Ok(port)
}
