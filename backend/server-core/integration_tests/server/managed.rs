use server_core::error::server::ServerError;
use server_core::{
    ManagedServerProcess, PortResolver, Readiness, ServerFamily, ServerKind, ServerState,
};

use models::ServerPropertiesBuilder;

use std::path::Path;
use std::time::Duration;

use serial_test::serial;

// ============================================================================
// Lifecycle handle behavior without a real server binary
// ============================================================================

/// **VALUE**: Verifies that a fresh handle is inert.
#[test]
fn given_new_handle_then_not_running_and_uninitialized() {
    let handle = ManagedServerProcess::new(ServerFamily::Redis);

    assert!(!handle.is_running());
    assert_eq!(handle.state(), ServerState::Uninitialized);
    assert_eq!(handle.port(), None);
    assert_eq!(handle.default_port(), 6379);
}

/// **VALUE**: Verifies that starting an uninitialized handle fails cleanly.
///
/// **BUG THIS CATCHES**: Would catch a panic on the missing engine, or the handle moving
/// to a running state it cannot honor.
#[tokio::test]
async fn given_uninitialized_handle_when_started_then_returns_uninitialized() {
    // GIVEN: No engine
    let mut handle = ManagedServerProcess::new(ServerFamily::Redis);

    // WHEN: Starting
    let result = handle.start().await;

    // THEN: Uninitialized error, state unchanged
    assert!(matches!(result, Err(ServerError::Uninitialized { .. })));
    assert_eq!(handle.state(), ServerState::Uninitialized);
    assert!(handle.engine().is_err());
    assert!(handle.endpoint().is_err());
}

/// **VALUE**: Verifies that stop is a safe no-op before start and when repeated.
///
/// **WHY THIS MATTERS**: Shutdown hooks run unconditionally. A stop that fails or panics
/// on an unstarted handle turns every aborted startup into a second crash.
#[tokio::test]
async fn given_unstarted_handle_when_stopped_twice_then_no_error() {
    let mut handle = ManagedServerProcess::new(ServerFamily::Valkey);

    handle.stop().await;
    handle.stop().await;

    assert!(!handle.is_running());
}

/// **VALUE**: Verifies that a missing executable override fails at build time.
///
/// **BUG THIS CATCHES**: Would catch the missing binary only surfacing on start, after
/// a port has been handed out.
#[test]
fn given_nonexistent_executable_when_built_then_returns_launch_error() {
    // GIVEN: A resolved port and a bogus path
    let port = PortResolver::new(6379).resolve(0).unwrap();

    // WHEN: Building
    let result = ManagedServerProcess::build(
        ServerFamily::Redis,
        Some(Path::new("/nonexistent/redis-server")),
        port,
    );

    // THEN: Launch error
    assert!(matches!(result, Err(ServerError::Launch { .. })));
}

/// **VALUE**: Verifies that properties with an occupied custom port fail resolution.
#[test]
fn given_properties_with_occupied_port_when_built_then_returns_port_error() {
    // GIVEN: Properties naming a held port
    let (_listener, port) = crate::helpers::occupy_port();
    let properties = ServerPropertiesBuilder::default()
        .using_port(i32::from(port))
        .build()
        .unwrap();

    // WHEN: Building from properties
    let result = ManagedServerProcess::from_properties(ServerFamily::Redis, &properties);

    // THEN: Port error surfaces through the server error
    match result {
        Err(ServerError::Port(err)) => assert_eq!(err.port(), i32::from(port)),
        other => panic!("Expected port error, got {other:?}"),
    }
}

/// A kind whose readiness banner is not a valid regex.
struct BrokenPatternKind;

impl ServerKind for BrokenPatternKind {
    fn name(&self) -> &str {
        "broken"
    }

    fn binary(&self) -> &str {
        "broken-server"
    }

    fn default_port(&self) -> u16 {
        6379
    }

    fn readiness_pattern(&self) -> &str {
        "Ready to accept ("
    }
}

/// **VALUE**: Verifies that a missing engine is reported before anything else.
///
/// **BUG THIS CATCHES**: Would catch readiness setup running first, which reports an
/// unrelated pattern error for a handle that was simply never initialized.
#[tokio::test]
async fn given_uninitialized_handle_with_bad_pattern_when_started_then_uninitialized() {
    // GIVEN: An uninitialized handle whose kind has an invalid banner regex
    let mut handle = ManagedServerProcess::new(BrokenPatternKind);

    // WHEN: Starting
    let result = handle.start().await;

    // THEN: Uninitialized, not Validation
    assert!(matches!(result, Err(ServerError::Uninitialized { .. })));
}

// ============================================================================
// Full lifecycle against a fake server script
// ============================================================================

#[cfg(unix)]
mod fake_process {
    use super::*;
    use crate::helpers::{
        CRASHING_SCRIPT, INVALID_UTF8_SCRIPT, LISTENING_SCRIPT, READY_SCRIPT, SILENT_SCRIPT,
        fake_server, has_python3,
    };

    use sysinfo::{Pid, ProcessStatus, ProcessesToUpdate, System};

    fn is_alive(pid: u32) -> bool {
        let pid = Pid::from_u32(pid);
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        sys.process(pid)
            .is_some_and(|p| p.status() != ProcessStatus::Zombie)
    }

    fn handle_for(script: &Path) -> ManagedServerProcess<ServerFamily> {
        let port = PortResolver::for_kind(&ServerFamily::Redis).resolve(0).unwrap();
        ManagedServerProcess::build(ServerFamily::Redis, Some(script), port).unwrap()
    }

    /// **VALUE**: Verifies the happy path: build, start, observe, stop.
    ///
    /// **WHY THIS MATTERS**: This is the sequence every test fixture built on the handle
    /// runs. If readiness detection or shutdown breaks, every consumer hangs or leaks.
    ///
    /// **BUG THIS CATCHES**: Would catch readiness never being detected from stdout, the
    /// state machine skipping states, or the process surviving stop.
    #[tokio::test]
    #[serial]
    async fn given_ready_script_when_started_then_running_until_stopped() {
        // GIVEN: A script that prints the readiness banner
        let fake = fake_server(READY_SCRIPT);
        let mut handle = handle_for(&fake.path);
        assert_eq!(handle.state(), ServerState::Created);

        // WHEN: Starting
        handle.start().await.unwrap();

        // THEN: Running with a live PID and a loopback endpoint
        assert!(handle.is_running());
        assert_eq!(handle.state(), ServerState::Running);
        assert!(handle.engine().unwrap().pid().is_some());
        let endpoint = handle.endpoint().unwrap();
        assert_eq!(endpoint.host, "127.0.0.1");
        assert_eq!(Some(endpoint.port), handle.port());

        // WHEN: Stopping
        handle.stop().await;

        // THEN: Terminal state
        assert!(!handle.is_running());
        assert_eq!(handle.state(), ServerState::Stopped);

        // WHEN: Stopping again
        handle.stop().await;

        // THEN: Still stopped, nothing running
        assert!(!handle.is_running());
        assert_eq!(handle.state(), ServerState::Stopped);
    }

    /// **VALUE**: Verifies that a second start on a running handle is refused.
    #[tokio::test]
    #[serial]
    async fn given_running_handle_when_started_again_then_already_running() {
        let fake = fake_server(READY_SCRIPT);
        let mut handle = handle_for(&fake.path);
        handle.start().await.unwrap();

        let result = handle.start().await;

        assert!(matches!(result, Err(ServerError::AlreadyRunning { .. })));
        assert_eq!(handle.state(), ServerState::Running);
        handle.stop().await;
    }

    /// **VALUE**: Verifies that a stopped handle cannot be restarted.
    ///
    /// **BUG THIS CATCHES**: Would catch a restart silently reusing a port that another
    /// process may have taken since the stop.
    #[tokio::test]
    #[serial]
    async fn given_stopped_handle_when_started_then_returns_terminated() {
        let fake = fake_server(READY_SCRIPT);
        let mut handle = handle_for(&fake.path);
        handle.start().await.unwrap();
        handle.stop().await;

        let result = handle.start().await;

        assert!(matches!(result, Err(ServerError::Terminated { .. })));
    }

    /// **VALUE**: Verifies that a server that never announces readiness times out.
    ///
    /// **WHY THIS MATTERS**: Without a bound, a misconfigured server hangs the caller
    /// forever instead of failing the test run.
    ///
    /// **BUG THIS CATCHES**: Would catch an unbounded readiness loop, or the child being
    /// left running after the timeout.
    #[tokio::test]
    #[serial]
    async fn given_silent_script_when_started_then_times_out() {
        // GIVEN: A script that never prints the banner and a short budget
        let fake = fake_server(SILENT_SCRIPT);
        let mut handle = handle_for(&fake.path).with_startup_timeout(Duration::from_millis(300));

        // WHEN: Starting
        let result = handle.start().await;

        // THEN: Timeout, and the handle is finished
        assert!(matches!(result, Err(ServerError::Timeout { .. })));
        assert!(!handle.is_running());
        assert_eq!(handle.state(), ServerState::Stopped);
    }

    /// **VALUE**: Verifies that a server exiting during startup is reported as a launch failure.
    ///
    /// **BUG THIS CATCHES**: Would catch an early exit being misreported as a timeout after
    /// the full startup window.
    #[tokio::test]
    #[serial]
    async fn given_crashing_script_when_started_then_returns_launch_error() {
        let fake = fake_server(CRASHING_SCRIPT);
        let mut handle = handle_for(&fake.path);

        let result = handle.start().await;

        assert!(matches!(result, Err(ServerError::Launch { .. })));
        assert!(!handle.is_running());
    }

    /// **VALUE**: Verifies that custom readiness replaces the kind's log pattern.
    #[tokio::test]
    #[serial]
    async fn given_custom_readiness_when_started_then_predicate_decides() {
        // GIVEN: A silent script and a predicate satisfied by any live PID
        let fake = fake_server(SILENT_SCRIPT);
        let mut handle = handle_for(&fake.path)
            .with_readiness(Readiness::custom(|ctx| ctx.pid.is_some()))
            .with_startup_timeout(Duration::from_secs(2));

        // WHEN: Starting
        let result = handle.start().await;

        // THEN: Ready without the banner
        assert!(result.is_ok());
        assert!(handle.is_running());
        handle.stop().await;
    }

    /// **VALUE**: Verifies that an engine can only be built once per handle.
    #[test]
    fn given_initialized_handle_when_initialized_again_then_fails() {
        let fake = fake_server(READY_SCRIPT);
        let mut handle = handle_for(&fake.path);
        let port = PortResolver::new(6379).resolve(0).unwrap();

        let result = handle.initialize(Some(fake.path.as_path()), port);

        assert!(matches!(result, Err(ServerError::AlreadyInitialized { .. })));
        assert_eq!(handle.kind().name(), "redis");
    }

    /// **VALUE**: Verifies that a server printing invalid UTF-8 still starts and stays up.
    ///
    /// **WHY THIS MATTERS**: Servers echo client names, keys and locale-dependent text to
    /// their log. If one bad byte stops the output reader, the closed pipe kills the
    /// server with SIGPIPE on its next write.
    ///
    /// **BUG THIS CATCHES**: Would catch the output reader giving up on a decode error,
    /// before readiness (a `Launch` failure) or after it (a dead server that still
    /// reports running).
    #[tokio::test]
    #[serial]
    async fn given_invalid_utf8_output_when_started_then_ready_and_alive() {
        // GIVEN: A script printing an invalid UTF-8 line before the banner, then more output
        let fake = fake_server(INVALID_UTF8_SCRIPT);
        let mut handle = handle_for(&fake.path).with_startup_timeout(Duration::from_secs(3));

        // WHEN: Starting
        let result = handle.start().await;

        // THEN: Ready despite the bad line
        assert!(result.is_ok(), "start failed: {result:?}");
        let pid = handle.engine().unwrap().pid().unwrap();

        // AND: Still alive while it keeps writing
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(is_alive(pid), "server died after writing more output");
        assert!(handle.is_running());

        handle.stop().await;
    }

    /// **VALUE**: Verifies listening-socket readiness against a child that really listens.
    ///
    /// **WHY THIS MATTERS**: Servers that print no banner can only be detected through the
    /// socket table. The PID filter must match the spawned child.
    ///
    /// **BUG THIS CATCHES**: Would catch the socket query or the PID match never
    /// succeeding, which turns every such start into a timeout.
    #[tokio::test]
    #[serial]
    async fn given_listening_child_when_started_with_listening_readiness_then_ready() {
        if !has_python3() {
            eprintln!("python3 not available, skipping listening readiness test");
            return;
        }

        // GIVEN: A child that listens on the resolved port without printing
        let fake = fake_server(LISTENING_SCRIPT);
        let mut handle = handle_for(&fake.path)
            .with_readiness(Readiness::Listening)
            .with_startup_timeout(Duration::from_secs(5));

        // WHEN: Starting
        let result = handle.start().await;

        // THEN: Ready once the socket is in LISTEN state
        assert!(result.is_ok(), "start failed: {result:?}");
        assert!(handle.is_running());

        handle.stop().await;
        assert_eq!(handle.state(), ServerState::Stopped);
    }
}
