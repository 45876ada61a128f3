use crate::DEFAULT_REDIS_PORT;
use crate::server::kind::{REDIS_READY_PATTERN, ServerFamily, ServerKind};

use regex::Regex;

/// A kind relying on the trait's default launch arguments.
struct BareKind;

impl ServerKind for BareKind {
    fn name(&self) -> &str {
        "bare"
    }

    fn binary(&self) -> &str {
        "bare-server"
    }

    fn default_port(&self) -> u16 {
        7777
    }

    fn readiness_pattern(&self) -> &str {
        "up"
    }
}

/// **VALUE**: Verifies the default `--port`/`--bind` argument shape.
///
/// **BUG THIS CATCHES**: Would catch the host and port being swapped, which makes the
/// server try to bind a hostname named after a number.
#[test]
fn given_default_launch_args_when_built_then_port_precedes_bind() {
    // GIVEN: A kind without custom arguments
    let kind = BareKind;

    // WHEN: Building arguments
    let args = kind.launch_args("127.0.0.1", 4242);

    // THEN: Exactly port then bind
    assert_eq!(args, vec!["--port", "4242", "--bind", "127.0.0.1"]);
}

/// **VALUE**: Verifies that embedded Redis instances never persist to disk.
///
/// **WHY THIS MATTERS**: A throwaway test server writing `dump.rdb` into the working
/// directory pollutes repositories and leaks state between runs.
///
/// **BUG THIS CATCHES**: Would catch the `--save ""` or `--appendonly no` flags going missing.
#[test]
fn given_redis_family_when_launch_args_built_then_disables_persistence() {
    // GIVEN/WHEN: Arguments for Redis
    let args = ServerFamily::Redis.launch_args("127.0.0.1", 6400);

    // THEN: Port, bind, and persistence flags are present
    assert_eq!(&args[..4], ["--port", "6400", "--bind", "127.0.0.1"]);
    let save = args.iter().position(|a| a == "--save").unwrap();
    assert_eq!(args[save + 1], "");
    let aof = args.iter().position(|a| a == "--appendonly").unwrap();
    assert_eq!(args[aof + 1], "no");
}

/// **VALUE**: Verifies the per-family binary names and the shared default port.
#[test]
fn given_server_families_when_queried_then_report_binary_and_default_port() {
    assert_eq!(ServerFamily::Redis.binary(), "redis-server");
    assert_eq!(ServerFamily::Valkey.binary(), "valkey-server");
    assert_eq!(ServerFamily::Redis.default_port(), DEFAULT_REDIS_PORT);
    assert_eq!(ServerFamily::Valkey.default_port(), DEFAULT_REDIS_PORT);
    assert_eq!(ServerFamily::default(), ServerFamily::Redis);
}

/// **VALUE**: Verifies the readiness banner regex against real Redis output lines.
///
/// **BUG THIS CATCHES**: Would catch a pattern that only matches Redis 7 output and hangs
/// every start against Redis 6 until timeout.
#[test]
fn given_redis_banners_when_matched_then_old_and_new_formats_are_recognized() {
    // GIVEN: The readiness pattern
    let re = Regex::new(REDIS_READY_PATTERN).unwrap();

    // WHEN/THEN: Redis 6 and 7 banners match, unrelated output does not
    assert!(re.is_match("1:M 01 Jan 2024 00:00:00.000 * Ready to accept connections"));
    assert!(re.is_match("1:M 01 Jan 2024 00:00:00.000 * Ready to accept connections tcp"));
    assert!(!re.is_match("1:M 01 Jan 2024 00:00:00.000 * Server initialized"));
}
