use server_core::error::CoreError;
use server_core::error::server::ServerError;
use server_core::{PortResolver, ServerFamily};

use std::path::Path;

use crate::helpers::occupy_port;

/// **VALUE**: Verifies that error messages carry the caller's source location.
///
/// **WHY THIS MATTERS**: Launch failures in CI are debugged from logs alone. The location
/// points straight at the call site that failed.
///
/// **BUG THIS CATCHES**: Would catch `#[track_caller]` being dropped so every error points
/// into library internals.
#[test]
fn given_port_error_when_displayed_then_includes_kind_and_location() {
    // GIVEN: An occupied port
    let (_listener, port) = occupy_port();

    // WHEN: Resolving it explicitly
    let err = PortResolver::new(6379).resolve(i32::from(port)).unwrap_err();

    // THEN: Display names the error kind and a source location
    let text = err.to_string();
    assert!(text.contains("Port Unavailable Error"), "got: {text}");
    assert!(text.contains(".rs:"), "location missing: {text}");
}

#[test]
fn given_launch_error_when_displayed_then_names_executable() {
    let port = PortResolver::new(6379).resolve(0).unwrap();

    let err = server_core::ManagedServerProcess::build(
        ServerFamily::Redis,
        Some(Path::new("/nonexistent/redis-server")),
        port,
    )
    .unwrap_err();

    let text = err.to_string();
    assert!(text.starts_with("Launch Error:"), "got: {text}");
    assert!(text.contains("/nonexistent/redis-server"));
}

/// **VALUE**: Verifies that wrapping in `CoreError` keeps the inner message intact.
#[test]
fn given_server_error_when_wrapped_in_core_error_then_display_is_transparent() {
    let port = PortResolver::new(6379).resolve(0).unwrap();
    let inner = server_core::ManagedServerProcess::build(
        ServerFamily::Redis,
        Some(Path::new("/nonexistent/redis-server")),
        port,
    )
    .unwrap_err();
    let expected = inner.to_string();

    let wrapped = CoreError::from(inner);

    assert_eq!(wrapped.to_string(), expected);
    assert!(matches!(wrapped, CoreError::Server(ServerError::Launch { .. })));
}
