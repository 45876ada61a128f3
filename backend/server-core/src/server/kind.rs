use crate::DEFAULT_REDIS_PORT;

use serde::{Deserialize, Serialize};

/// Banner printed by Redis-compatible servers once the listener is up.
///
/// Redis 7+ prints `Ready to accept connections tcp`, older builds stop after `connections`.
pub const REDIS_READY_PATTERN: &str = r"Ready to accept connections(?: tcp)?";

const PORT_FLAG: &str = "--port";
const BIND_FLAG: &str = "--bind";
const SAVE_FLAG: &str = "--save";
const APPENDONLY_FLAG: &str = "--appendonly";

/// What differs between families of embeddable servers.
///
/// Implementations are plain values chosen when the handle is built; there is no
/// inheritance chain to override.
pub trait ServerKind: Send + Sync {
    /// Short lowercase name used in logs.
    fn name(&self) -> &str;

    /// Executable looked up on `PATH` when no override is configured.
    fn binary(&self) -> &str;

    /// Port clients assume when none is configured.
    fn default_port(&self) -> u16;

    /// Regex matched against stdout lines to detect readiness.
    fn readiness_pattern(&self) -> &str;

    /// Command line arguments for a server bound to `host:port`.
    fn launch_args(&self, host: &str, port: u16) -> Vec<String> {
        vec![
            PORT_FLAG.to_string(),
            port.to_string(),
            BIND_FLAG.to_string(),
            host.to_string(),
        ]
    }
}

/// Built-in Redis-compatible server families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerFamily {
    #[default]
    Redis,
    Valkey,
}

impl ServerKind for ServerFamily {
    fn name(&self) -> &str {
        match self {
            ServerFamily::Redis => "redis",
            ServerFamily::Valkey => "valkey",
        }
    }

    fn binary(&self) -> &str {
        match self {
            ServerFamily::Redis => "redis-server",
            ServerFamily::Valkey => "valkey-server",
        }
    }

    fn default_port(&self) -> u16 {
        DEFAULT_REDIS_PORT
    }

    fn readiness_pattern(&self) -> &str {
        REDIS_READY_PATTERN
    }

    // Embedded instances are throwaway: no RDB snapshots, no AOF.
    fn launch_args(&self, host: &str, port: u16) -> Vec<String> {
        vec![
            PORT_FLAG.to_string(),
            port.to_string(),
            BIND_FLAG.to_string(),
            host.to_string(),
            SAVE_FLAG.to_string(),
            String::new(),
            APPENDONLY_FLAG.to_string(),
            String::from("no"),
        ]
    }
}
