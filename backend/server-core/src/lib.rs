pub mod config;
pub mod connection;
pub mod error;
pub mod port;
pub mod server;


pub use port::{PortOrigin, PortRequest, PortResolver, ResolvedPort};
pub use server::kind::{ServerFamily, ServerKind};
pub use server::lifecycle::Lifecycle;
pub use server::managed::{ManagedServerProcess, ServerState};
pub use server::readiness::{Readiness, ReadinessContext};

/// Embedded servers are only ever bound to, and reached on, the loopback interface.
pub const EMBEDDED_SERVER_HOST: &str = "127.0.0.1";
pub const REDIS_URL_SCHEME: &str = "redis://";
pub const EMBEDDED_SERVER_BASE_URL: &str =
    const_format::concatcp!(REDIS_URL_SCHEME, EMBEDDED_SERVER_HOST);

/// Conventional port of Redis-compatible servers.
pub const DEFAULT_REDIS_PORT: u16 = 6379;

/// Binding to this port asks the OS for any free port.
pub const EPHEMERAL_PORT: u16 = 0;
