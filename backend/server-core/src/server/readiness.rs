//! Deciding when a freshly spawned server is actually serving.
//!
//! Spawning returns as soon as the OS has started the process, long before the server has
//! bound its port. The engine polls a [`Readiness`] strategy in a bounded backoff loop
//! instead of trusting the spawn to be synchronous.

use crate::error::server::ServerError;
use crate::server::kind::ServerKind;

use common::ErrorLocation;

use std::fmt::{Debug, Formatter, Result as FormatResult};
use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use backoff::ExponentialBackoff;
use log::trace;
use netstat2::{AddressFamilyFlags, ProtocolFlags, ProtocolSocketInfo, TcpState, get_sockets_info};
use regex::Regex;

pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(10);
const READINESS_INITIAL_INTERVAL: Duration = Duration::from_millis(25);
const READINESS_MAX_INTERVAL: Duration = Duration::from_millis(500);

pub type ReadinessPredicate = Arc<dyn Fn(&ReadinessContext) -> bool + Send + Sync>;

/// What the readiness predicate gets to look at on each poll.
#[derive(Debug, Clone)]
pub struct ReadinessContext {
    pub pid: Option<u32>,
    pub host: String,
    pub port: u16,
    /// Whether any stdout line so far matched the log pattern (if one is configured).
    pub output_matched: bool,
}

/// Strategy for detecting that the child accepts connections.
#[derive(Clone)]
pub enum Readiness {
    /// Ready as soon as the process is spawned.
    Immediate,
    /// Ready once a stdout line matches.
    LogPattern(Regex),
    /// Ready once the child's PID owns a listening TCP socket on the port.
    Listening,
    /// Caller supplied predicate.
    Custom(ReadinessPredicate),
}

impl Debug for Readiness {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        match self {
            Readiness::Immediate => write!(f, "Immediate"),
            Readiness::LogPattern(re) => write!(f, "LogPattern({})", re.as_str()),
            Readiness::Listening => write!(f, "Listening"),
            Readiness::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl Readiness {
    /// Compile `pattern` into a [`Readiness::LogPattern`].
    #[track_caller]
    pub fn log_pattern(pattern: &str) -> Result<Self, ServerError> {
        Regex::new(pattern)
            .map(Readiness::LogPattern)
            .map_err(|e| ServerError::Validation {
                message: format!("Invalid readiness pattern '{pattern}': {e}"),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    /// The log pattern announced by `kind`.
    #[track_caller]
    pub fn for_kind<K: ServerKind + ?Sized>(kind: &K) -> Result<Self, ServerError> {
        Self::log_pattern(kind.readiness_pattern())
    }

    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&ReadinessContext) -> bool + Send + Sync + 'static,
    {
        Readiness::Custom(Arc::new(predicate))
    }

    pub(crate) fn pattern(&self) -> Option<&Regex> {
        match self {
            Readiness::LogPattern(re) => Some(re),
            _ => None,
        }
    }

    pub(crate) fn is_ready(&self, context: &ReadinessContext) -> bool {
        match self {
            Readiness::Immediate => true,
            Readiness::LogPattern(_) => context.output_matched,
            Readiness::Listening => context
                .pid
                .is_some_and(|pid| is_listening(pid, context.port)),
            Readiness::Custom(predicate) => predicate(context),
        }
    }
}

/// Backoff schedule for one readiness wait, giving up after `timeout`.
pub(crate) fn readiness_backoff(timeout: Duration) -> ExponentialBackoff {
    ExponentialBackoff {
        current_interval: READINESS_INITIAL_INTERVAL,
        initial_interval: READINESS_INITIAL_INTERVAL,
        max_interval: READINESS_MAX_INTERVAL,
        max_elapsed_time: Some(timeout),
        ..Default::default()
    }
}

/// `true` if `pid` holds a TCP socket in LISTEN state on `port`.
///
/// Socket table query failures count as "not yet".
pub(crate) fn is_listening(pid: u32, port: u16) -> bool {
    let sockets = match get_sockets_info(
        AddressFamilyFlags::IPV4 | AddressFamilyFlags::IPV6,
        ProtocolFlags::TCP,
    ) {
        Ok(sockets) => sockets,
        Err(e) => {
            trace!("Failed to query network sockets: {e}");
            return false;
        }
    };

    sockets.iter().any(|s| {
        matches!(
            &s.protocol_socket_info,
            ProtocolSocketInfo::Tcp(tcp) if tcp.state == TcpState::Listen && tcp.local_port == port
        ) && s.associated_pids.contains(&pid)
    })
}
